//! Lenient policy decoding and cache encoding.
//!
//! Decoding is field-by-field: each field is read or defaulted on its own, so
//! a payload with wrong types or missing keys still yields a usable policy.
//! The cache uses the same wire shape plus `cachedForAppVersion`, and goes
//! through the same decoder on the way back in.

use super::{GateMode, GatePolicy, GateRule, GateType, Severity};
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// `storeUrls` entry type for the App Store link.
const APP_STORE_URL_TYPE: i64 = 0;

/// Decode a policy from raw JSON text. Never fails: invalid JSON yields the
/// default (live, empty token) policy.
pub fn decode_policy(raw: &str) -> GatePolicy {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => decode_policy_value(&value),
        Err(e) => {
            debug!(error = %e, "policy payload is not JSON, using defaults");
            GatePolicy::default()
        }
    }
}

/// Decode a policy from an already-parsed JSON value.
pub fn decode_policy_value(value: &Value) -> GatePolicy {
    let Some(obj) = value.as_object() else {
        debug!("policy payload is not an object, using defaults");
        return GatePolicy::default();
    };

    GatePolicy {
        mode: decode_mode(obj),
        last_updated_at: string_field(obj, "lastGateUpdate").unwrap_or_default(),
        latest_version: non_empty(string_field(obj, "latestVersion")),
        whats_new: non_empty(string_field(obj, "whatsNew")),
        store_url: non_empty(string_field(obj, "storeUrl")).or_else(|| app_store_url(obj)),
        cached_for_app_version: non_empty(string_field(obj, "cachedForAppVersion")),
    }
}

/// `gateType` wins when present; otherwise rule fields select client mode;
/// otherwise the policy is server-computed live.
fn decode_mode(obj: &Map<String, Value>) -> GateMode {
    match obj.get("gateType") {
        Some(Value::Null) | None => {}
        Some(raw) => {
            let gate_type = raw.as_i64().map_or(GateType::Live, GateType::from_code);
            return GateMode::ServerComputed { gate_type };
        }
    }

    let minimum_version = obj.get("minVersion").and_then(decode_rule);
    let blocked = obj.get("blockedVersions").and_then(Value::as_array);

    if minimum_version.is_none() && blocked.is_none() {
        return GateMode::default();
    }

    GateMode::ClientComputed {
        minimum_version,
        blocked_versions: blocked
            .map(|rows| rows.iter().filter_map(decode_rule).collect())
            .unwrap_or_default(),
    }
}

/// Rule rows must be objects; a missing or unknown `type` means dismissable.
fn decode_rule(value: &Value) -> Option<GateRule> {
    let obj = value.as_object()?;
    let version = string_field(obj, "version").unwrap_or_default();
    let severity = obj
        .get("type")
        .and_then(Value::as_i64)
        .and_then(Severity::from_code)
        .unwrap_or(Severity::Dismissable);
    Some(GateRule { version, severity })
}

fn app_store_url(obj: &Map<String, Value>) -> Option<String> {
    obj.get("storeUrls")?
        .as_array()?
        .iter()
        .filter_map(Value::as_object)
        .find(|entry| entry.get("type").and_then(Value::as_i64) == Some(APP_STORE_URL_TYPE))
        .and_then(|entry| non_empty(string_field(entry, "url")))
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRule<'a> {
    version: &'a str,
    #[serde(rename = "type")]
    kind: i64,
}

impl<'a> From<&'a GateRule> for WireRule<'a> {
    fn from(rule: &'a GateRule) -> Self {
        WireRule {
            version: &rule.version,
            kind: rule.severity.code(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePolicy<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    gate_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_version: Option<WireRule<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked_versions: Option<Vec<WireRule<'a>>>,
    last_gate_update: &'a str,
    latest_version: Option<&'a str>,
    whats_new: Option<&'a str>,
    store_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cached_for_app_version: Option<&'a str>,
}

/// Encode a policy in wire shape for the cache.
///
/// Client-computed policies always carry `blockedVersions` (possibly empty)
/// so they decode back into client mode.
pub fn encode_policy(policy: &GatePolicy) -> Result<String> {
    let (gate_type, min_version, blocked_versions) = match &policy.mode {
        GateMode::ServerComputed { gate_type } => (Some(gate_type.code()), None, None),
        GateMode::ClientComputed {
            minimum_version,
            blocked_versions,
        } => (
            None,
            minimum_version.as_ref().map(WireRule::from),
            Some(blocked_versions.iter().map(WireRule::from).collect()),
        ),
    };

    let wire = WirePolicy {
        gate_type,
        min_version,
        blocked_versions,
        last_gate_update: &policy.last_updated_at,
        latest_version: policy.latest_version.as_deref(),
        whats_new: policy.whats_new.as_deref(),
        store_url: policy.store_url.as_deref(),
        cached_for_app_version: policy.cached_for_app_version.as_deref(),
    };

    serde_json::to_string(&wire)
        .map_err(|e| Error::Serialization(format!("Failed to encode policy: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_empty_object_decodes_to_default() {
        let policy = decode_policy("{}");
        assert_eq!(policy, GatePolicy::default());
        assert_eq!(policy.blocking_severity(&v("1.0")), None);
    }

    #[test]
    fn test_token_only_payload() {
        let policy = decode_policy(r#"{"lastGateUpdate":"t"}"#);
        assert_eq!(policy.last_updated_at, "t");
        assert_eq!(
            policy.mode,
            GateMode::ServerComputed {
                gate_type: GateType::Live
            }
        );
        assert_eq!(policy.blocking_severity(&v("0.1")), None);
        assert!(policy.latest_version.is_none());
        assert!(policy.whats_new.is_none());
        assert!(policy.store_url.is_none());
    }

    #[test]
    fn test_bad_gate_type_decodes_to_live() {
        for raw in [
            r#"{"gateType":"0"}"#,
            r#"{"gateType":999}"#,
            r#"{"gateType":-1}"#,
            r#"{"gateType":1.5}"#,
            r#"{"gateType":{"a":1}}"#,
            r#"{"gateType":null}"#,
        ] {
            let policy = decode_policy(raw);
            assert_eq!(policy.blocking_severity(&v("1.0")), None, "payload {}", raw);
        }
    }

    #[test]
    fn test_server_computed_payload() {
        let policy = decode_policy(
            r#"{
                "gateType": 0,
                "lastGateUpdate": "2024-05-01T10:00:00Z",
                "latestVersion": "3.2.0",
                "whatsNew": "Bug fixes",
                "storeUrl": "https://apps.example/app"
            }"#,
        );
        assert_eq!(policy.blocking_severity(&v("1.0")), Some(Severity::Forced));
        assert_eq!(policy.last_updated_at, "2024-05-01T10:00:00Z");
        assert_eq!(policy.latest_version.as_deref(), Some("3.2.0"));
        assert_eq!(policy.whats_new.as_deref(), Some("Bug fixes"));
        assert_eq!(policy.store_url.as_deref(), Some("https://apps.example/app"));
    }

    #[test]
    fn test_client_computed_payload() {
        let policy = decode_policy(
            r#"{
                "minVersion": {"version": "1.0.0", "type": 0},
                "blockedVersions": [{"version": "2.1.0", "type": 0}],
                "lastGateUpdate": "t",
                "storeUrls": [
                    {"type": 1, "url": "https://play.example/app"},
                    {"type": 0, "url": "https://apps.example/app"}
                ]
            }"#,
        );
        assert_eq!(policy.blocking_severity(&v("2.1.0")), Some(Severity::Forced));
        assert_eq!(policy.blocking_severity(&v("2.2.0")), None);
        assert_eq!(policy.blocking_severity(&v("0.9")), Some(Severity::Forced));
        assert_eq!(policy.store_url.as_deref(), Some("https://apps.example/app"));
    }

    #[test]
    fn test_rule_type_defaults_to_dismissable() {
        let policy = decode_policy(
            r#"{"minVersion": {"version": "2.0.0"}, "blockedVersions": [{"version": "3.0", "type": 7}, 5, "x"]}"#,
        );
        match &policy.mode {
            GateMode::ClientComputed {
                minimum_version,
                blocked_versions,
            } => {
                assert_eq!(minimum_version.as_ref().unwrap().severity, Severity::Dismissable);
                assert_eq!(blocked_versions.len(), 1);
                assert_eq!(blocked_versions[0].severity, Severity::Dismissable);
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_server_gate_wins_over_rules() {
        let policy = decode_policy(
            r#"{"gateType": 3, "minVersion": {"version": "9.0.0", "type": 0}}"#,
        );
        assert_eq!(policy.blocking_severity(&v("1.0")), None);
    }

    #[test]
    fn test_malformed_inputs_never_fail() {
        for raw in [
            "",
            "not json",
            "[]",
            "42",
            r#"{"lastGateUpdate": 12, "latestVersion": [], "whatsNew": {}, "storeUrl": false}"#,
            r#"{"minVersion": "2.0", "blockedVersions": {"version": "1"}}"#,
            r#"{"storeUrls": [{"type": 0}, {"type": "0", "url": "x"}]}"#,
        ] {
            let policy = decode_policy(raw);
            assert_eq!(policy.last_updated_at, "");
            assert!(policy.latest_version.is_none());
            assert!(policy.store_url.is_none());
            assert_eq!(policy.blocking_severity(&v("1.0")), None, "payload {:?}", raw);
        }
    }

    #[test]
    fn test_cache_encoding_preserves_evaluation() {
        let mut policy = GatePolicy::client_computed(
            None,
            vec![GateRule::new("1.4.2", Severity::Modal)],
            "t2",
        );
        policy.whats_new = Some("Faster sync".to_string());
        let stamped = policy.stamped_for("1.4.2");

        let decoded = decode_policy(&encode_policy(&stamped).unwrap());
        assert_eq!(decoded, stamped);
        assert_eq!(decoded.blocking_severity(&v("1.4.2")), Some(Severity::Modal));
    }

    #[test]
    fn test_empty_client_rules_stay_client_mode() {
        let policy = GatePolicy::client_computed(None, vec![], "t");
        let decoded = decode_policy(&encode_policy(&policy).unwrap());
        assert!(matches!(decoded.mode, GateMode::ClientComputed { .. }));
    }
}
