//! Logging Infrastructure
//!
//! Structured logging setup over tracing-subscriber. The embedding process
//! calls this once at startup; tests and library consumers that bring their
//! own subscriber simply skip it.

/// Initialize the logger at the default `info` level
pub fn init_logger() {
    init_logger_with_level("info");
}

/// Initialize the logger with an explicit max level
pub fn init_logger_with_level(level: &str) {
    tracing_subscriber::fmt()
        .with_max_level(level.parse().unwrap_or(tracing::Level::INFO))
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false)
        .init();
}
