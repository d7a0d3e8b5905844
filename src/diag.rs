//! Human-readable diagnostics for the application.

use core::fmt::{self, Write};

use heapless::String;

/// Longest diagnostic line; longer lines are truncated.
pub const LOG_LINE_LEN: usize = 128;

/// Severity of a diagnostic line.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogLevel {
    /// Normal protocol traffic and state changes.
    Info,
    /// Protocol anomalies the driver recovered from.
    Warn,
}

/// Receives diagnostic lines from the driver.
pub trait LogSink {
    /// Called synchronously from [`begin`](crate::DisplaxTouch::begin) or
    /// [`poll`](crate::DisplaxTouch::poll).
    fn log(&self, level: LogLevel, message: &str);
}

impl<F: Fn(LogLevel, &str)> LogSink for F {
    fn log(&self, level: LogLevel, message: &str) {
        self(level, message)
    }
}

pub(crate) struct Diagnostics<'a> {
    sink: Option<&'a dyn LogSink>,
}

impl<'a> Diagnostics<'a> {
    pub fn new() -> Self {
        Self { sink: None }
    }

    pub fn set_sink(&mut self, sink: Option<&'a dyn LogSink>) {
        self.sink = sink;
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        #[cfg(feature = "log")]
        ::log::info!("{}", args);
        self.emit(LogLevel::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        #[cfg(feature = "log")]
        ::log::warn!("{}", args);
        self.emit(LogLevel::Warn, args);
    }

    fn emit(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        let Some(sink) = self.sink else {
            return;
        };

        let mut line = String::<LOG_LINE_LEN>::new();
        // Overflow leaves the line truncated.
        let _ = line.write_fmt(args);
        sink.log(level, &line);
    }
}
