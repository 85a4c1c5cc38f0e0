use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variable that overrides the default log level
pub const LOG_LEVEL_ENV: &str = "NEUROPOD_LOG";

/// Where log lines go
pub enum LogSink {
    Stdout,
    /// Append to a single file, creating parent directories as needed
    File(PathBuf),
}

/// Line-oriented logger shared by every neuropod crate
///
/// Each line is `timestamp [LEVEL] [thread:..] file:line - message`.
pub struct NeuropodLogger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl NeuropodLogger {
    pub fn stdout(level: LevelFilter) -> Self {
        Self { level, file: None }
    }

    pub fn file(path: impl AsRef<Path>, level: LevelFilter) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            level,
            file: Some(Mutex::new(file)),
        })
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }
}

pub fn format_record(record: &Record) -> String {
    format!(
        "{} [{}] [thread:{:?}] {}:{} - {}",
        format_timestamp(),
        record.level(),
        std::thread::current().id(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.args()
    )
}

impl Log for NeuropodLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record);
        match &self.file {
            None => println!("{line}"),
            Some(file) => {
                let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
                if let Err(e) = writeln!(file, "{line}") {
                    eprintln!("failed to write log file: {e}");
                    eprintln!("{line}");
                }
            }
        }
    }

    fn flush(&self) {
        match &self.file {
            None => {
                std::io::stdout().flush().ok();
            }
            Some(file) => {
                let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
                file.flush().ok();
            }
        }
    }
}

/// Parse a level name as accepted in `NEUROPOD_LOG`
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Debug in debug builds, Info in release
pub fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Level from `NEUROPOD_LOG`, falling back to [`default_level`]
pub fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or_else(default_level)
}

/// Install the process-wide logger
///
/// Only the first call in a process installs anything; later calls return
/// `Ok(false)`.
pub fn init_logger(sink: LogSink) -> std::io::Result<bool> {
    let level = level_from_env();
    let logger = match sink {
        LogSink::Stdout => NeuropodLogger::stdout(level),
        LogSink::File(path) => NeuropodLogger::file(path, level)?,
    };

    // set_logger needs a 'static reference; a rejected logger stays leaked.
    if log::set_logger(Box::leak(Box::new(logger))).is_ok() {
        log::set_max_level(level);
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Format current time as YYYY-MM-DDTHH:MM:SS (UTC)
pub fn format_timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let (year, month, day) = civil_from_days((secs / 86400) as i64);
    let time_of_day = secs % 86400;

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        year,
        month,
        day,
        time_of_day / 3600,
        (time_of_day % 3600) / 60,
        time_of_day % 60
    )
}

/// Days since the Unix epoch to a civil (year, month, day)
///
/// Howard Hinnant's days_from_civil inverse, http://howardhinnant.github.io/date_algorithms.html
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe as i64 + era * 400;
    (if m <= 2 { y + 1 } else { y }, m, d)
}
