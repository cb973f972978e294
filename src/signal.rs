//! Lifecycle signals reported to the host's analytics sink.

use crate::error::Result;
use std::fmt;
use tracing::info;

/// The fixed set of signals the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// First-ever run on this install.
    FirstLaunch,
    /// Every launch or return to foreground.
    AppOpen,
    /// A block verdict was surfaced.
    GateEnforced,
}

impl Signal {
    pub fn name(self) -> &'static str {
        match self {
            Signal::FirstLaunch => "first-launch",
            Signal::AppOpen => "app-open",
            Signal::GateEnforced => "gate-enforced",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fire-and-forget event sink.
///
/// The engine never retries and never looks at the outcome beyond logging an
/// error; a failing emitter cannot change a verdict.
pub trait SignalEmitter {
    fn emit(&mut self, name: &str, value: &str) -> Result<()>;
}

/// Discards every signal.
#[derive(Debug, Clone, Default)]
pub struct NoOpEmitter;

impl SignalEmitter for NoOpEmitter {
    fn emit(&mut self, _name: &str, _value: &str) -> Result<()> {
        Ok(())
    }
}

/// Writes signals to the log.
#[derive(Debug, Clone, Default)]
pub struct LogEmitter;

impl SignalEmitter for LogEmitter {
    fn emit(&mut self, name: &str, value: &str) -> Result<()> {
        info!(signal = name, value, "signal");
        Ok(())
    }
}
