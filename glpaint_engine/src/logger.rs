use ansi_term::Colour;
use chrono::Local;
use err_derive::Error;
use log::{error, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fmt::Display;
use std::process;

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error(display = "Failed to set logger: {}", err)]
    SetLogger { err: SetLoggerError },
}

pub struct Logger {
    color: bool,
    level: LevelFilter,
}

impl Logger {
    pub fn init(color: bool) -> Result<(), LoggerInitError> {
        Logger::init_with_level(color, LevelFilter::Info)
    }

    pub fn init_with_level(color: bool, level: LevelFilter) -> Result<(), LoggerInitError> {
        log::set_boxed_logger(Box::new(Logger { color, level }))
            .map_err(|err| LoggerInitError::SetLogger { err })?;
        log::set_max_level(level);

        Ok(())
    }

    fn format(&self, time: &str, level: Level, target: &str, message: &str) -> String {
        let level = if self.color {
            level_colour(level).paint(level.to_string()).to_string()
        } else {
            level.to_string()
        };

        format!("[{} {} {}] {}", time, level, target, message)
    }
}

fn level_colour(level: Level) -> Colour {
    match level {
        Level::Error => Colour::Red,
        Level::Warn => Colour::Yellow,
        Level::Info => Colour::Green,
        Level::Debug => Colour::Cyan,
        Level::Trace => Colour::Purple,
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format(
            &Local::now().format("%H:%M:%S").to_string(),
            record.level(),
            record.target(),
            &record.args().to_string(),
        );

        if record.level() <= Level::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    fn flush(&self) {}
}

/// For binaries: log the error and exit instead of panicking.
pub trait UnwrapOrLog<T> {
    fn unwrap_or_log(self, context: &str) -> T;
}

impl<T, E: Display> UnwrapOrLog<T> for Result<T, E> {
    fn unwrap_or_log(self, context: &str) -> T {
        match self {
            Ok(val) => val,
            Err(err) => {
                error!("{}: {}", context, err);
                log::logger().flush();
                process::exit(1);
            }
        }
    }
}
