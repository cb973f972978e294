use crate::policy::{GatePolicy, Severity};
use serde::Serialize;
use std::fmt;

/// What caused an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// First configure after process start. Consumes the first-launch marker.
    Launch,
    /// App returned to the foreground.
    Foreground,
}

/// Display metadata the update screen needs, passed through from the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePrompt {
    pub latest_version: Option<String>,
    pub whats_new: Option<String>,
    pub store_url: Option<String>,
    pub last_updated_at: String,
}

impl From<&GatePolicy> for UpdatePrompt {
    fn from(policy: &GatePolicy) -> Self {
        UpdatePrompt {
            latest_version: policy.latest_version.clone(),
            whats_new: policy.whats_new.clone(),
            store_url: policy.store_url.clone(),
            last_updated_at: policy.last_updated_at.clone(),
        }
    }
}

/// Per-evaluation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    NoBlock,
    Block {
        severity: Severity,
        dismissable: bool,
        prompt: UpdatePrompt,
    },
}

impl Verdict {
    pub fn block(severity: Severity, policy: &GatePolicy) -> Self {
        Verdict::Block {
            severity,
            dismissable: severity.is_dismissable(),
            prompt: UpdatePrompt::from(policy),
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Block { .. })
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            Verdict::Block { severity, .. } => Some(*severity),
            Verdict::NoBlock => None,
        }
    }

    pub fn is_dismissable(&self) -> bool {
        matches!(self, Verdict::Block { dismissable: true, .. })
    }

    pub fn prompt(&self) -> Option<&UpdatePrompt> {
        match self {
            Verdict::Block { prompt, .. } => Some(prompt),
            Verdict::NoBlock => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::NoBlock => f.write_str("no-block"),
            Verdict::Block {
                severity,
                dismissable,
                ..
            } => write!(f, "block ({}, dismissable: {})", severity, dismissable),
        }
    }
}
