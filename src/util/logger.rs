//! Colored, timestamped console logging.
//!
//! Every level macro expands to [`log_line!`](crate::log_line) with its own ANSI color
//! and a fixed-width tag, so the columns of concurrent vehicle logs line up.

/// Prints a single log line with the given ANSI color code and tag.
#[macro_export]
macro_rules! log_line {
    ($color:literal, $tag:literal, $($arg:tt)*) => {
        println!(
            concat!("\x1b[", $color, "m", $tag, "[{}]\x1b[0m {}"),
            chrono::Utc::now().format("%H:%M:%S"),
            format!($($arg)*)
        )
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::log_line!("32", "[INFO] ", $($arg)*) };
}

#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => { $crate::log_line!("33", "[LOG]  ", $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::log_line!("35", "[WARN] ", $($arg)*) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::log_line!("31", "[ERROR]", $($arg)*) };
}

/// Doctrine events: autonomous returns, anchors, landings, forced disarms.
#[macro_export]
macro_rules! nav {
    ($($arg:tt)*) => { $crate::log_line!("1;34", "[NAV]  ", $($arg)*) };
}

/// High-volume console traffic, only printed when `LOG_AEGIS_EVENTS` is set.
#[macro_export]
macro_rules! event {
    ($($arg:tt)*) => {
        if std::env::var("LOG_AEGIS_EVENTS").is_ok() {
            $crate::log_line!("36", "[EVENT]", $($arg)*)
        }
    };
}

/// Unrecoverable startup failures. Panics with the formatted message.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        panic!(
            "\x1b[1;31m[FATAL][{}]\x1b[0m {}",
            chrono::Utc::now().format("%H:%M:%S"),
            format!($($arg)*)
        )
    };
}
