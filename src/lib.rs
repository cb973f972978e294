//! Client-side version gate: decides on each launch or foreground whether the
//! running app version must be blocked pending an update.

pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod logger;
pub mod policy;
pub mod signal;
pub mod storage;
pub mod version;

pub use engine::{ComplianceEngine, Trigger, UpdatePrompt, Verdict};
pub use error::{Error, Result};
pub use policy::{GateMode, GatePolicy, GateRule, GateType, Severity};
pub use version::Version;
