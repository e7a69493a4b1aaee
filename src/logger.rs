//! A colourised console + log-file sink, installed as the global
//! [`log`] backend.

use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::thread;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct ConsoleFileLogger {
    pub file: Option<Mutex<RefCell<File>>>,
    pub verbose: bool,
    pub colour: bool,
}

impl Log for ConsoleFileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let min_level = if self.verbose { Level::Trace } else { Level::Info };
        metadata.level() <= min_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let cur = thread::current();
        let tid = cur.name().unwrap_or("<?>");
        let loc = format!(
            "[{}:{} - {}]",
            record.file().unwrap_or("<?>"),
            record.line().unwrap_or(0),
            record.module_path().unwrap_or("<?>"),
        );
        let fmt = format!("{}", record.args()).replace('\n', "\n\t\t   ");
        let msg = format!("[TID={}]\t{}\t{}\n\t\t-- {}\n", tid, record.level(), loc, fmt);

        if let Some(f) = self.file.as_ref() {
            if let Ok(cell) = f.lock() {
                let _ = writeln!(cell.borrow_mut(), "{msg}");
            }
        }

        if !self.colour {
            println!("{msg}");
        } else {
            let colour_code = match record.level() {
                Level::Error => "\x1B[31m\x1B[1m", // Bold, red.
                Level::Warn => "\x1B[33m\x1B[1m",  // Bold, yellow.
                Level::Info => "\x1B[32m\x1B[1m",  // Bold, green.
                _ => "\x1B[34m\x1B[1m",            // Bold, blue.
            };
            println!(
                "\x1B[0m\x1B[2m[TID={}]\t{}{}\x1B[0m\x1B[2m\t{}\x1B[1m\n\t\t-- {}\x1B[0m\n",
                tid,
                colour_code,
                record.level(),
                loc,
                fmt
            );
        }
    }

    fn flush(&self) {
        if let Some(f) = self.file.as_ref() {
            if let Ok(cell) = f.lock() {
                let _ = cell.borrow_mut().flush();
            }
        }
    }
}

/// Opens `file` for logging and installs the global logger. `verbose`
/// enables `Trace`-level output; `colour` switches on the ANSI escape
/// sequences above (meant for an attached terminal, not a redirected
/// file).
pub fn init_with(file: &Path, verbose: bool, colour: bool) -> Result<(), SetLoggerError> {
    let logger = ConsoleFileLogger {
        file: File::create(file).ok().map(|f| Mutex::new(RefCell::new(f))),
        verbose,
        colour,
    };
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
