use core::fmt::{self, Write};

use log::{Level, LevelFilter, Log, Metadata, Record};
use spin::Mutex;

use crate::earth;

/// serialises whole lines so output of different cores does not interleave
static CONSOLE_LOCK: Mutex<()> = Mutex::new(());

struct Console;

impl Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // nothing to print on before the earth layer is installed
        if let Some(earth) = earth::get() {
            earth.tty_write(s);
        }
        Ok(())
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    let _guard = CONSOLE_LOCK.lock();
    let _ = Console.write_fmt(args);
}

/// Used by the panic handler: the lock may be held by the panicking core
#[doc(hidden)]
pub fn _panic_print(args: fmt::Arguments) {
    let _ = Console.write_fmt(args);
}

#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => ($crate::logger::_print(format_args!($($arg)*)));
}

#[macro_export]
macro_rules! kprintln {
    () => ($crate::kprint!("\r\n"));
    ($fmt:expr) => ($crate::kprint!(concat!($fmt, "\r\n")));
    ($fmt:expr, $($arg:tt)+) => ($crate::kprint!(concat!($fmt, "\r\n"), $($arg)+));
}

#[macro_export]
macro_rules! panic_println {
    ($fmt:expr) => ($crate::logger::_panic_print(format_args!(concat!($fmt, "\r\n"))));
    ($fmt:expr, $($arg:tt)+) => ($crate::logger::_panic_print(format_args!(concat!($fmt, "\r\n"), $($arg)+)));
}

struct KernelLogger;

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let (secs, usecs) = match earth::get() {
            Some(earth) => {
                let now = earth.mtime_get();
                (now / 1_000_000, now % 1_000_000)
            }
            None => (0, 0),
        };
        crate::kprintln!(
            "\x1b[{}m[{:>4}.{:06} {:<5}]\x1b[0m {}",
            level_color(record.level()),
            secs,
            usecs,
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}

fn level_color(level: Level) -> u8 {
    match level {
        Level::Error => 31, // red
        Level::Warn => 93,  // yellow
        Level::Info => 36,  // cyan
        Level::Debug => 32, // green
        Level::Trace => 90, // gray
    }
}

/// Picks the level from the `LOG` variable at build time
pub fn level_from_env(env: Option<&str>) -> LevelFilter {
    match env {
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        Some("off") => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

pub fn init() {
    static LOGGER: KernelLogger = KernelLogger;
    // a second call keeps the logger that is already there
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level_from_env(option_env!("LOG")));
}
