use std::time::Instant;

use log::{Level, Metadata, Record};

lazy_static! {
    static ref STARTED_AT: Instant = Instant::now();
}

/// Writes log records to stderr, prefixed with the time elapsed since the
/// first record. Filtering is left to `log::set_max_level`.
pub struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = STARTED_AT.elapsed();
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        eprintln!(
            "[{:>4}.{:03}s {}] {}",
            elapsed.as_secs(),
            elapsed.subsec_millis(),
            level,
            record.args()
        );
    }

    fn flush(&self) {}
}
