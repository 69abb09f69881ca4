//! Category-based logging shared by every emulated component.
//!
//! Each component logs under a [`LogCategory`]. Verbosity is controlled per
//! category, falling back to a global level, and can be configured at runtime
//! from a compact spec string such as `"warn,cpu=debug,ppu=trace"`.
//!
//! Messages are built lazily: the closure passed to [`log`] only runs when the
//! category/level pair is enabled and the per-category rate limit allows it.
//! Output goes to stderr, or to a file written by a background thread once
//! [`LogConfig::set_log_file`] has been called.
//!
//! ```rust
//! use emu_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Interrupts, LogLevel::Debug, || {
//!     format!("NMI -> {:04X}", 0xC000)
//! });
//! ```

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

impl FromStr for LogLevel {
    type Err = LogSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(LogLevel::Off),
            "error" | "err" | "1" => Ok(LogLevel::Error),
            "warn" | "warning" | "2" => Ok(LogLevel::Warn),
            "info" | "3" => Ok(LogLevel::Info),
            "debug" | "4" => Ok(LogLevel::Debug),
            "trace" | "5" => Ok(LogLevel::Trace),
            _ => Err(LogSpecError::UnknownLevel(s.to_string())),
        }
    }
}

/// Emulated component a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Instruction execution
    CPU,
    /// Processor bus decode, DMA
    Bus,
    /// Picture processor registers and rendering
    PPU,
    /// NMI/IRQ entry
    Interrupts,
    /// ROM loading and mapper accesses
    Cartridge,
    /// Controller ports
    Input,
}

const CATEGORY_COUNT: usize = 6;

impl LogCategory {
    pub const ALL: [LogCategory; CATEGORY_COUNT] = [
        LogCategory::CPU,
        LogCategory::Bus,
        LogCategory::PPU,
        LogCategory::Interrupts,
        LogCategory::Cartridge,
        LogCategory::Input,
    ];

    fn index(self) -> usize {
        match self {
            LogCategory::CPU => 0,
            LogCategory::Bus => 1,
            LogCategory::PPU => 2,
            LogCategory::Interrupts => 3,
            LogCategory::Cartridge => 4,
            LogCategory::Input => 5,
        }
    }

    /// Short tag used as the message prefix.
    pub fn tag(self) -> &'static str {
        match self {
            LogCategory::CPU => "CPU",
            LogCategory::Bus => "BUS",
            LogCategory::PPU => "PPU",
            LogCategory::Interrupts => "INT",
            LogCategory::Cartridge => "CART",
            LogCategory::Input => "INPUT",
        }
    }
}

impl FromStr for LogCategory {
    type Err = LogSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(LogCategory::CPU),
            "bus" => Ok(LogCategory::Bus),
            "ppu" => Ok(LogCategory::PPU),
            "int" | "irq" | "interrupts" => Ok(LogCategory::Interrupts),
            "cart" | "cartridge" => Ok(LogCategory::Cartridge),
            "input" | "joy" => Ok(LogCategory::Input),
            _ => Err(LogSpecError::UnknownCategory(s.to_string())),
        }
    }
}

/// Failure to parse a level, category or `category=level` list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogSpecError {
    #[error("unknown log level '{0}'")]
    UnknownLevel(String),
    #[error("unknown log category '{0}'")]
    UnknownCategory(String),
}

#[derive(Default)]
struct Window {
    stamps: VecDeque<Instant>,
    dropped: usize,
    last_report: Option<Instant>,
}

/// Sliding one-second window per category.
struct RateLimiter {
    max_per_second: AtomicUsize,
    windows: Mutex<[Window; CATEGORY_COUNT]>,
}

impl RateLimiter {
    const WINDOW: Duration = Duration::from_secs(1);

    fn new(max_per_second: usize) -> Self {
        Self {
            max_per_second: AtomicUsize::new(max_per_second),
            windows: Mutex::new(Default::default()),
        }
    }

    /// Returns whether this message may be emitted, plus a count of
    /// previously dropped messages when it is time to report them.
    fn admit(&self, category: LogCategory) -> (bool, Option<usize>) {
        let now = Instant::now();
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let w = &mut windows[category.index()];

        while let Some(&front) = w.stamps.front() {
            if now.duration_since(front) > Self::WINDOW {
                w.stamps.pop_front();
            } else {
                break;
            }
        }

        if w.stamps.len() < self.max_per_second.load(Ordering::Relaxed) {
            w.stamps.push_back(now);
            if w.dropped > 0 {
                let dropped = std::mem::take(&mut w.dropped);
                w.last_report = Some(now);
                return (true, Some(dropped));
            }
            return (true, None);
        }

        w.dropped += 1;
        let due = w
            .last_report
            .map_or(true, |last| now.duration_since(last) >= Self::WINDOW);
        if due {
            w.last_report = Some(now);
            (false, Some(std::mem::take(&mut w.dropped)))
        } else {
            (false, None)
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    global_level: AtomicU8,
    levels: [AtomicU8; CATEGORY_COUNT],
    file_sink: Mutex<Option<Sender<String>>>,
    limiter: RateLimiter,
}

impl LogConfig {
    /// Everything off, 60 messages per second per category.
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            levels: Default::default(),
            file_sink: Mutex::new(None),
            limiter: RateLimiter::new(60),
        }
    }

    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.levels[category.index()].load(Ordering::Relaxed))
    }

    /// A category with its own level ignores the global one; a category
    /// left at `Off` inherits it.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        match self.level(category) {
            LogLevel::Off => level <= self.global_level(),
            own => level <= own,
        }
    }

    /// Apply a comma-separated list of `level` or `category=level` items.
    ///
    /// Nothing is changed when any item fails to parse.
    pub fn apply_spec(&self, spec: &str) -> Result<(), LogSpecError> {
        let mut global = None;
        let mut per_category = Vec::new();
        for item in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match item.split_once('=') {
                Some((cat, lvl)) => per_category.push((cat.parse()?, lvl.parse()?)),
                None => global = Some(item.parse()?),
            }
        }
        if let Some(level) = global {
            self.set_global_level(level);
        }
        for (category, level) in per_category {
            self.set_level(category, level);
        }
        Ok(())
    }

    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    pub fn set_rate_limit(&self, max_logs_per_second: usize) {
        self.limiter
            .max_per_second
            .store(max_logs_per_second, Ordering::Relaxed);
    }

    pub fn rate_limit(&self) -> usize {
        self.limiter.max_per_second.load(Ordering::Relaxed)
    }

    /// Append all further output to `path` from a background writer thread.
    ///
    /// Replaces any previously configured file.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel::<String>();

        thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || {
                while let Ok(line) = receiver.recv() {
                    let _ = writeln!(file, "{}", line);
                    let _ = file.flush();
                }
            })?;

        *self.sink() = Some(sender);
        Ok(())
    }

    /// Go back to stderr. The writer thread exits once its channel closes.
    pub fn clear_log_file(&self) {
        *self.sink() = None;
    }

    fn sink(&self) -> std::sync::MutexGuard<'_, Option<Sender<String>>> {
        match self.file_sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, line: String) {
        let sink = self.sink();
        match sink.as_ref() {
            Some(sender) => {
                if let Err(failed) = sender.send(line) {
                    eprintln!("{}", failed.0);
                }
            }
            None => eprintln!("{}", line),
        }
    }
}

/// Log a lazily-built message under `category` at `level`.
///
/// The closure is skipped entirely when the pair is disabled or the
/// category is over its rate limit. Dropped messages are summarised once
/// the limiter lets output through again.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if !config.should_log(category, level) {
        return;
    }

    let (allowed, dropped) = config.limiter.admit(category);
    if let Some(count) = dropped.filter(|&n| n > 0) {
        config.emit(format!(
            "[{}] rate limit exceeded, {} message(s) dropped",
            category.tag(),
            count
        ));
    }
    if allowed {
        config.emit(format!("[{}] {}", category.tag(), message_fn()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("off".parse(), Ok(LogLevel::Off));
        assert_eq!("ERR".parse(), Ok(LogLevel::Error));
        assert_eq!("Warning".parse(), Ok(LogLevel::Warn));
        assert_eq!("3".parse(), Ok(LogLevel::Info));
        assert_eq!(" debug ".parse(), Ok(LogLevel::Debug));
        assert_eq!("TRACE".parse(), Ok(LogLevel::Trace));
        assert_eq!(
            "loud".parse::<LogLevel>(),
            Err(LogSpecError::UnknownLevel("loud".to_string()))
        );
    }

    #[test]
    fn test_log_category_parsing() {
        assert_eq!("cpu".parse(), Ok(LogCategory::CPU));
        assert_eq!("PPU".parse(), Ok(LogCategory::PPU));
        assert_eq!("cart".parse(), Ok(LogCategory::Cartridge));
        assert_eq!("irq".parse(), Ok(LogCategory::Interrupts));
        assert!("apu".parse::<LogCategory>().is_err());
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Off < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_category_level_overrides_global() {
        let config = LogConfig::new();
        config.set_global_level(LogLevel::Error);
        config.set_level(LogCategory::CPU, LogLevel::Debug);

        assert!(config.should_log(LogCategory::CPU, LogLevel::Debug));
        assert!(!config.should_log(LogCategory::CPU, LogLevel::Trace));
        assert!(config.should_log(LogCategory::Bus, LogLevel::Error));
        assert!(!config.should_log(LogCategory::Bus, LogLevel::Warn));
    }

    #[test]
    fn test_off_messages_never_log() {
        let config = LogConfig::new();
        config.set_global_level(LogLevel::Trace);
        assert!(!config.should_log(LogCategory::PPU, LogLevel::Off));
    }

    #[test]
    fn test_apply_spec_sets_global_and_categories() {
        let config = LogConfig::new();
        config
            .apply_spec("warn, cpu=debug,ppu=trace")
            .expect("valid spec");

        assert_eq!(config.global_level(), LogLevel::Warn);
        assert_eq!(config.level(LogCategory::CPU), LogLevel::Debug);
        assert_eq!(config.level(LogCategory::PPU), LogLevel::Trace);
        assert_eq!(config.level(LogCategory::Bus), LogLevel::Off);
    }

    #[test]
    fn test_apply_spec_rejects_without_partial_update() {
        let config = LogConfig::new();
        let err = config.apply_spec("cpu=debug,gpu=info").unwrap_err();
        assert_eq!(err, LogSpecError::UnknownCategory("gpu".to_string()));
        assert_eq!(config.level(LogCategory::CPU), LogLevel::Off);
    }

    #[test]
    fn test_reset() {
        let config = LogConfig::new();
        config.apply_spec("trace,cpu=debug,input=info").expect("valid spec");
        config.reset();

        assert_eq!(config.global_level(), LogLevel::Off);
        for category in LogCategory::ALL {
            assert_eq!(config.level(category), LogLevel::Off);
        }
    }

    #[test]
    fn test_rate_limiter_is_per_category() {
        let limiter = RateLimiter::new(60);
        for _ in 0..60 {
            assert!(limiter.admit(LogCategory::CPU).0);
        }
        assert!(!limiter.admit(LogCategory::CPU).0);
        assert!(limiter.admit(LogCategory::Bus).0);
    }

    #[test]
    fn test_rate_limiter_reports_drops_after_window() {
        let limiter = RateLimiter::new(5);
        for _ in 0..5 {
            limiter.admit(LogCategory::PPU);
        }
        // first drop reports immediately, the rest accumulate
        let (allowed, first) = limiter.admit(LogCategory::PPU);
        assert!(!allowed);
        assert_eq!(first, Some(1));
        for _ in 0..4 {
            assert_eq!(limiter.admit(LogCategory::PPU), (false, None));
        }

        std::thread::sleep(Duration::from_millis(1100));

        let (allowed, dropped) = limiter.admit(LogCategory::PPU);
        assert!(allowed);
        assert_eq!(dropped, Some(4));
    }

    #[test]
    fn test_rate_limit_setting() {
        let config = LogConfig::new();
        assert_eq!(config.rate_limit(), 60);
        config.set_rate_limit(1000);
        assert_eq!(config.rate_limit(), 1000);
    }
}
