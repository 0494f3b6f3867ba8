//! The diagnostic channel filters write progress and summary lines to.
//!
//! What is written here is observable, but must never influence a decision. The line format is not
//! a stable interface.

use std::fmt;

/// The severity of a diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// A protocol violation, usually followed by an abort.
    Error,
    /// A recoverable misconfiguration.
    Warn,
    /// Progress and summaries.
    Info,
    /// Details useful when debugging a filter.
    Debug,
    /// Per-object output.
    Trace,
}

/// A sink for human-readable diagnostics, provided by the engine.
pub trait Sink {
    /// Write `message` at `level`.
    fn emit(&mut self, level: Level, message: fmt::Arguments<'_>);

    /// Write `message` as warning.
    fn warn(&mut self, message: fmt::Arguments<'_>) {
        self.emit(Level::Warn, message);
    }

    /// Write `message` as information.
    fn info(&mut self, message: fmt::Arguments<'_>) {
        self.emit(Level::Info, message);
    }

    /// Write `message` at the most verbose level.
    fn trace(&mut self, message: fmt::Arguments<'_>) {
        self.emit(Level::Trace, message);
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn emit(&mut self, level: Level, message: fmt::Arguments<'_>) {
        (**self).emit(level, message);
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn emit(&mut self, level: Level, message: fmt::Arguments<'_>) {
        (**self).emit(level, message);
    }
}

/// Forward all lines to [`tracing`] using the `filter` target.
#[derive(Debug, Clone)]
pub struct Tracing {
    label: String,
}

impl Tracing {
    /// Tag every event with `label`, typically the name of the bound filter.
    pub fn new(label: impl Into<String>) -> Self {
        Tracing { label: label.into() }
    }

    /// The label attached to every event.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for Tracing {
    fn default() -> Self {
        Tracing::new("filter")
    }
}

impl Sink for Tracing {
    fn emit(&mut self, level: Level, message: fmt::Arguments<'_>) {
        let filter = self.label.as_str();
        match level {
            Level::Error => tracing::error!(target: "filter", filter, "{message}"),
            Level::Warn => tracing::warn!(target: "filter", filter, "{message}"),
            Level::Info => tracing::info!(target: "filter", filter, "{message}"),
            Level::Debug => tracing::debug!(target: "filter", filter, "{message}"),
            Level::Trace => tracing::trace!(target: "filter", filter, "{message}"),
        }
    }
}

/// Discard everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl Sink for Discard {
    fn emit(&mut self, _level: Level, _message: fmt::Arguments<'_>) {}
}

/// A line captured by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// The severity of the line.
    pub level: Level,
    /// The formatted message.
    pub message: String,
}

/// Keep all lines in memory, for hosts that relay diagnostics elsewhere and for inspection.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    lines: Vec<Line>,
}

impl Recorder {
    /// All lines in the order they were emitted.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Lines emitted at exactly `level`.
    pub fn at(&self, level: Level) -> impl Iterator<Item = &Line> + '_ {
        self.lines.iter().filter(move |line| line.level == level)
    }

    /// The amount of lines emitted at exactly `level`.
    pub fn count(&self, level: Level) -> usize {
        self.at(level).count()
    }

    /// The first line at `level` that contains `needle`.
    pub fn find(&self, level: Level, needle: &str) -> Option<&Line> {
        self.at(level).find(|line| line.message.contains(needle))
    }

    /// Remove all lines and return them.
    pub fn take(&mut self) -> Vec<Line> {
        std::mem::take(&mut self.lines)
    }
}

impl Sink for Recorder {
    fn emit(&mut self, level: Level, message: fmt::Arguments<'_>) {
        self.lines.push(Line {
            level,
            message: message.to_string(),
        });
    }
}
