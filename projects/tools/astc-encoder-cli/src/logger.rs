//! Minimal stderr logger for the command line tool.

use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("[{:>5}] {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Level named by `ASTC_LOG` (`off`, `error`, `warn`, `info`, `debug` or `trace`).
fn level_from_env() -> Option<LevelFilter> {
    std::env::var("ASTC_LOG").ok()?.trim().parse().ok()
}

/// Installs the logger. `verbose` selects debug output regardless of `ASTC_LOG`.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        level_from_env().unwrap_or(LevelFilter::Warn)
    };

    // Only fails if a logger is already installed.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
