use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{LevelFilter, Metadata, Record};

struct SimpleLogger {
    level: LevelFilter,
}

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the logger behind a progress-bar aware wrapper. Progress bars must be added to the
/// returned `MultiProgress` so log lines are printed above them.
pub fn init(level: LevelFilter) -> Result<MultiProgress, log::SetLoggerError> {
    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), SimpleLogger { level })
        .try_init()
        .map(|()| log::set_max_level(level))?;
    Ok(multi)
}
