// Copyright (c) 2023 Easton Man
// Copyright (c) 2020 rCore
// Copyright (c) 2023 rCore/AcreOS
//
// Adapted from rCore https://github.com/rcore-os/rCore/blob/13ad2d19058901e6401a978d4e20acf7f5610666/kernel/src/logging.rs
// And AcreOS/modules/axlog/src/lib.rs

//! Console logger for the `log` facade
//!
//! The board supplies the console, usually a UART write routine. Every
//! disk call logs through `log`, so any other logger works just as well.

use core::fmt;
use core::str::FromStr;

use log::{self, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Once;

macro_rules! with_color {
    ($color_code:expr, $($arg:tt)*) => {{
        format_args!("\u{1B}[{}m{}\u{1B}[m", $color_code as u8, format_args!($($arg)*))
    }};
}

#[repr(u8)]
#[allow(dead_code)]
enum ColorCode {
    Black = 30,
    Red = 31,
    Green = 32,
    Yellow = 33,
    Blue = 34,
    Magenta = 35,
    Cyan = 36,
    White = 37,
    BrightBlack = 90,
    BrightRed = 91,
    BrightGreen = 92,
    BrightYellow = 93,
    BrightBlue = 94,
    BrightMagenta = 95,
    BrightCyan = 96,
    BrightWhite = 97,
}

/// Sink for one formatted log line
pub type Console = fn(fmt::Arguments);

cfg_if::cfg_if! {
    // See https://doc.rust-lang.org/reference/conditional-compilation.html#debug_assertions
    if #[cfg(debug_assertions)] {
        pub const LOG_LEVEL: &str = "debug";
    } else {
        pub const LOG_LEVEL: &str = "warn";
    }
}

static CONSOLE: Once<Console> = Once::new();

/// Install the console logger at the default level.
pub fn init(console: Console) -> Result<(), SetLoggerError> {
    static LOGGER: ConsoleLogger = ConsoleLogger;
    log::set_logger(&LOGGER)?;
    CONSOLE.call_once(|| console);
    set_max_level(LOG_LEVEL);
    Ok(())
}

/// Unknown level names turn logging off.
pub fn set_max_level(level: &str) {
    let lf = LevelFilter::from_str(level).unwrap_or(LevelFilter::Off);
    log::set_max_level(lf);
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(console) = CONSOLE.get() else {
            return;
        };
        let level = record.level();
        let line = record.line().unwrap_or(0);
        let target = record.file().unwrap_or("");
        let level_color = match level {
            Level::Error => ColorCode::BrightRed,
            Level::Warn => ColorCode::BrightYellow,
            Level::Info => ColorCode::BrightGreen,
            Level::Debug => ColorCode::BrightCyan,
            Level::Trace => ColorCode::BrightBlack,
        };
        let args_color = match level {
            Level::Error => ColorCode::Red,
            Level::Warn => ColorCode::Yellow,
            Level::Info => ColorCode::Green,
            Level::Debug => ColorCode::Cyan,
            Level::Trace => ColorCode::BrightBlack,
        };
        console(with_color!(
            ColorCode::White,
            "[{} {} {}\n",
            with_color!(level_color, "{:<5}", level),
            with_color!(ColorCode::White, "{:>28}:{:<4}]", target, line),
            with_color!(args_color, "{}", record.args()),
        ));
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use core::fmt::Write;

    use log::{info, warn};
    use spin::Mutex;

    use super::*;

    static CAPTURED: Mutex<String> = Mutex::new(String::new());

    fn capture(args: fmt::Arguments) {
        let _ = CAPTURED.lock().write_fmt(args);
    }

    #[test]
    fn lines_reach_the_console() {
        init(capture).unwrap();
        info!("drive {} up", 3);
        warn!("drive {} gone", 4);
        let out = CAPTURED.lock().clone();
        assert!(out.contains("drive 3 up"));
        assert!(out.contains("drive 4 gone"));
        assert!(out.contains("logging.rs"));
        assert!(init(capture).is_err());
    }

    #[test]
    fn level_names() {
        assert!(LevelFilter::from_str("nonsense").is_err());
        assert!(LevelFilter::from_str(LOG_LEVEL).unwrap() > LevelFilter::Off);
    }
}
