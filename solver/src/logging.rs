//! Injected run logger.
//!
//! Each engine owns a [`RunLog`] handed to it at construction. There is no
//! process-wide verbosity switch: two engines running side by side can log
//! at different levels, and every record is emitted inside the engine's own
//! `tracing` span.

use std::fmt;

use tracing::Span;

/// How chatty a run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn as_str(self) -> &'static str {
        match self {
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logger carried by one engine or sampler instance.
#[derive(Debug, Clone)]
pub struct RunLog {
    span: Span,
    verbosity: Verbosity,
}

impl RunLog {
    /// Logger recording inside a span named after `tag`.
    pub fn new(tag: &'static str, verbosity: Verbosity) -> Self {
        Self {
            span: tracing::info_span!("run", tag),
            verbosity,
        }
    }

    /// Logger recording inside a caller-provided span.
    pub fn with_span(span: Span, verbosity: Verbosity) -> Self {
        Self { span, verbosity }
    }

    /// Logger that drops verbose records and has no span.
    pub fn quiet() -> Self {
        Self {
            span: Span::none(),
            verbosity: Verbosity::Normal,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity >= Verbosity::Verbose
    }

    /// Progress record, only emitted by verbose logs.
    pub fn verbose(&self, msg: fmt::Arguments<'_>) {
        if self.is_verbose() {
            let _g = self.span.enter();
            tracing::debug!("{}", msg);
        }
    }

    pub fn info(&self, msg: fmt::Arguments<'_>) {
        let _g = self.span.enter();
        tracing::info!("{}", msg);
    }

    pub fn warn(&self, msg: fmt::Arguments<'_>) {
        let _g = self.span.enter();
        tracing::warn!("{}", msg);
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::quiet()
    }
}
