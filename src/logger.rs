//! Logging backend for the `log` facade
//!
//! Log lines go to the console as `[LEVEL] target: message`. The operator
//! console text is not logged; it is written directly by the monitor. With
//! the default build only warnings and errors reach the wire, so the console
//! protocol is unchanged. The `verbose` feature lowers the filter to `Trace`.

use core::fmt::{self, Write};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::console::{Console, SerialWriter};

/// Maximum level compiled into this image
pub const MAX_LEVEL: LevelFilter = if cfg!(feature = "verbose") {
    LevelFilter::Trace
} else {
    LevelFilter::Warn
};

/// Logger writing to the global console
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = write_record(
                &mut SerialWriter(&mut Console),
                record.level(),
                record.target(),
                *record.args(),
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger::new(MAX_LEVEL);

/// Install the console logger
///
/// Fails if a logger is already set.
pub fn init() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(MAX_LEVEL))
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Render one log line
pub fn write_record<W: Write>(
    out: &mut W,
    level: Level,
    target: &str,
    args: fmt::Arguments,
) -> fmt::Result {
    writeln!(out, "[{}] {}: {}", level_tag(level), target, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::MetadataBuilder;

    #[test]
    fn test_record_format() {
        let mut out: heapless::String<64> = heapless::String::new();
        write_record(&mut out, Level::Warn, "cboot::monitor", format_args!("x={}", 3)).unwrap();
        assert_eq!(out.as_str(), "[WARN] cboot::monitor: x=3\n");
    }

    #[test]
    fn test_level_filter() {
        let logger = ConsoleLogger::new(LevelFilter::Warn);
        let warn = MetadataBuilder::new().level(Level::Warn).build();
        let debug = MetadataBuilder::new().level(Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn test_default_level() {
        if cfg!(feature = "verbose") {
            assert_eq!(MAX_LEVEL, LevelFilter::Trace);
        } else {
            assert_eq!(MAX_LEVEL, LevelFilter::Warn);
        }
    }
}
