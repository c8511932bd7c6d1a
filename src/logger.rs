use core::fmt::Write as _;

use log::{LevelFilter, Log, Metadata, Record};

use crate::libc::fs::Stderr;

/// Writes `[nix-ld] LEVEL: message` lines straight to standard error.
pub struct StderrLogger;

pub static LOGGER: StderrLogger = StderrLogger;

/// Level used until `NIX_LD_LOG` says otherwise.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::Warn;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(Stderr, "[nix-ld] {:>5}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs [`LOGGER`] at [`DEFAULT_LEVEL`]. Only the first call has an
/// effect.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(DEFAULT_LEVEL);
    }
}
