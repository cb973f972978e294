//! Gate policy model: what the backend says about which app versions may run.
//!
//! Two payload schemas exist in the wild. Older backends send rules
//! (`minVersion`, `blockedVersions`) that the client evaluates; newer ones
//! send a precomputed `gateType`. Both are normalized into [`GateMode`] at
//! decode time so nothing downstream branches on schema.

pub mod decode;

pub use decode::{decode_policy, decode_policy_value, encode_policy};

use crate::version::Version;
use serde::Serialize;
use std::fmt;

/// Strength of a gate. `Forced` can never be dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Forced,
    Dismissable,
    Modal,
}

impl Severity {
    /// Wire code: 0 = forced, 1 = dismissable, 2 = modal.
    pub fn code(self) -> i64 {
        match self {
            Severity::Forced => 0,
            Severity::Dismissable => 1,
            Severity::Modal => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Severity> {
        match code {
            0 => Some(Severity::Forced),
            1 => Some(Severity::Dismissable),
            2 => Some(Severity::Modal),
            _ => None,
        }
    }

    /// True for `Dismissable` and `Modal`.
    pub fn is_dismissable(self) -> bool {
        self != Severity::Forced
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Forced => "forced",
            Severity::Dismissable => "dismissable",
            Severity::Modal => "modal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-precomputed gate: a severity, or `Live` meaning not blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateType {
    Forced,
    Dismissable,
    Modal,
    Live,
}

impl GateType {
    /// Wire code 0..=3. Anything else means live.
    pub fn from_code(code: i64) -> GateType {
        match Severity::from_code(code) {
            Some(severity) => GateType::from(severity),
            None => GateType::Live,
        }
    }

    pub fn code(self) -> i64 {
        match self.severity() {
            Some(severity) => severity.code(),
            None => 3,
        }
    }

    pub fn severity(self) -> Option<Severity> {
        match self {
            GateType::Forced => Some(Severity::Forced),
            GateType::Dismissable => Some(Severity::Dismissable),
            GateType::Modal => Some(Severity::Modal),
            GateType::Live => None,
        }
    }
}

impl From<Severity> for GateType {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Forced => GateType::Forced,
            Severity::Dismissable => GateType::Dismissable,
            Severity::Modal => GateType::Modal,
        }
    }
}

/// One rule row: a target version and the severity applied when it matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateRule {
    pub version: String,
    pub severity: Severity,
}

impl GateRule {
    pub fn new(version: impl Into<String>, severity: Severity) -> Self {
        GateRule {
            version: version.into(),
            severity,
        }
    }

    /// Parsed target version; `None` if the server sent garbage, in which
    /// case the rule never triggers.
    pub fn target(&self) -> Option<Version> {
        Version::parse(&self.version)
    }
}

/// Normalized evaluation mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GateMode {
    /// Backend already decided for this app version.
    ServerComputed { gate_type: GateType },
    /// Client evaluates the rules against the running version.
    ClientComputed {
        minimum_version: Option<GateRule>,
        blocked_versions: Vec<GateRule>,
    },
}

impl GateMode {
    /// Severity that applies to `current`, or `None` when not blocked.
    ///
    /// `current` is `None` when the running version itself is unparseable;
    /// rules cannot match then, but a server-computed gate still applies.
    pub fn evaluate(&self, current: Option<&Version>) -> Option<Severity> {
        match self {
            GateMode::ServerComputed { gate_type } => gate_type.severity(),
            GateMode::ClientComputed {
                minimum_version,
                blocked_versions,
            } => {
                let current = current?;

                if let Some(rule) = minimum_version {
                    if rule.target().is_some_and(|min| *current < min) {
                        return Some(rule.severity);
                    }
                }

                blocked_versions
                    .iter()
                    .find(|rule| rule.target().is_some_and(|blocked| blocked == *current))
                    .map(|rule| rule.severity)
            }
        }
    }
}

impl Default for GateMode {
    fn default() -> Self {
        GateMode::ServerComputed {
            gate_type: GateType::Live,
        }
    }
}

/// The unit the engine reasons about: evaluation mode plus display metadata.
///
/// Built only by decoding (never fails) or by tests; immutable afterwards
/// except for the cache stamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GatePolicy {
    pub mode: GateMode,

    /// Opaque freshness token; any change means the policy changed.
    pub last_updated_at: String,

    pub latest_version: Option<String>,

    pub whats_new: Option<String>,

    pub store_url: Option<String>,

    /// App version this policy was cached for. Set by the engine, never by the server.
    pub cached_for_app_version: Option<String>,
}

impl GatePolicy {
    /// Server-computed policy with the given gate type and token.
    pub fn server_computed(gate_type: GateType, last_updated_at: impl Into<String>) -> Self {
        GatePolicy {
            mode: GateMode::ServerComputed { gate_type },
            last_updated_at: last_updated_at.into(),
            ..GatePolicy::default()
        }
    }

    /// Client-computed policy from a minimum version rule and a blocklist.
    pub fn client_computed(
        minimum_version: Option<GateRule>,
        blocked_versions: Vec<GateRule>,
        last_updated_at: impl Into<String>,
    ) -> Self {
        GatePolicy {
            mode: GateMode::ClientComputed {
                minimum_version,
                blocked_versions,
            },
            last_updated_at: last_updated_at.into(),
            ..GatePolicy::default()
        }
    }

    pub fn blocking_severity(&self, current: &Version) -> Option<Severity> {
        self.mode.evaluate(Some(current))
    }

    /// Evaluate against a raw version string as reported by the host.
    pub fn blocking_severity_for(&self, app_version: &str) -> Option<Severity> {
        let current = Version::parse(app_version);
        self.mode.evaluate(current.as_ref())
    }

    /// Copy of this policy stamped with the app version it is cached for.
    pub fn stamped_for(&self, app_version: &str) -> GatePolicy {
        GatePolicy {
            cached_for_app_version: Some(app_version.to_string()),
            ..self.clone()
        }
    }

    /// True if this cache entry belongs to `app_version`.
    pub fn is_cached_for(&self, app_version: &str) -> bool {
        self.cached_for_app_version.as_deref() == Some(app_version)
    }
}
