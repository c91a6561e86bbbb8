//! The `logDebug`/`logInfo`/`logWarn`/`logError` builtins and the
//! `logSetLevel` switch that gates them. The minimum level is the one piece
//! of mutable state in the core outside the scope chain (besides the
//! `Value` handles themselves), so it's a process-wide atomic rather than
//! something threaded through `Evaluator`.

use std::sync::atomic::{AtomicU8, Ordering};

use chrono::Local;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn from_u8(raw: u8) -> LogLevel {
        match raw {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }

    /// Parses the level names `logSetLevel` accepts; unrecognized names
    /// leave the level unchanged (see `set_level`).
    pub fn from_name(name: &str) -> Option<LogLevel> {
        match name.to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

static MIN_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Sets the minimum level a message must meet to be emitted. Returns
/// `false` (leaving the level unchanged) if `name` isn't recognized.
pub fn set_level(name: &str) -> bool {
    match LogLevel::from_name(name) {
        Some(level) => {
            MIN_LEVEL.store(level as u8, Ordering::Relaxed);
            true
        }
        None => false,
    }
}

/// Writes `message` to stderr as `[HH:MM:SS.mmm] LEVEL message`, if `level`
/// meets the current minimum.
pub fn log(level: LogLevel, message: &str) {
    if level < LogLevel::from_u8(MIN_LEVEL.load(Ordering::Relaxed)) {
        return;
    }
    eprintln!("[{}] {} {}", Local::now().format("%H:%M:%S%.3f"), level.label(), message);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unrecognized_level_name_is_rejected() {
        assert!(!set_level("verbose"));
        set_level("info");
    }

    #[test]
    fn level_ordering_treats_error_as_most_severe() {
        assert!(LogLevel::Error > LogLevel::Debug);
    }
}
