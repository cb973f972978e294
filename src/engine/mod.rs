//! Compliance decision engine: fetch or recall a policy, decide whether the
//! running version is gated, and decide whether the gate needs showing again.
//!
//! Every failure path fails open: the worst outcome of any fetch, storage or
//! emitter error is `Verdict::NoBlock`, never a panic or a spurious block.

pub mod verdict;

pub use verdict::{Trigger, UpdatePrompt, Verdict};

use crate::fetch::PolicyFetcher;
use crate::policy::{GatePolicy, Severity};
use crate::signal::{Signal, SignalEmitter};
use crate::storage::{ComplianceCache, LaunchMarker};
use tracing::{debug, info, warn};

/// Decision engine for one app instance.
///
/// `evaluate` takes `&mut self`, so triggers on one engine are serialized by
/// construction. Hosts that share it across threads put it behind a `Mutex`;
/// overlapping foreground events then queue instead of racing on the cache.
pub struct ComplianceEngine<F, S, E> {
    app_version: String,
    fetcher: F,
    storage: S,
    emitter: E,
    current_policy: Option<GatePolicy>,
    last_shown_token: Option<String>,
}

impl<F, S, E> ComplianceEngine<F, S, E>
where
    F: PolicyFetcher,
    S: ComplianceCache + LaunchMarker,
    E: SignalEmitter,
{
    pub fn new(app_version: impl Into<String>, fetcher: F, storage: S, emitter: E) -> Self {
        ComplianceEngine {
            app_version: app_version.into(),
            fetcher,
            storage,
            emitter,
            current_policy: None,
            last_shown_token: None,
        }
    }

    /// App version every decision and signal is made for.
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Policy adopted by the latest successful fetch or cache load.
    pub fn current_policy(&self) -> Option<&GatePolicy> {
        self.current_policy.as_ref()
    }

    /// Freshness token of the last policy actually surfaced as a block.
    pub fn last_shown_token(&self) -> Option<&str> {
        self.last_shown_token.as_deref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Run lifecycle signals for `trigger`, then decide.
    pub fn evaluate(&mut self, trigger: Trigger) -> Verdict {
        if trigger == Trigger::Launch {
            match self.storage.take_first_launch() {
                Ok(true) => self.emit(Signal::FirstLaunch),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "launch marker unavailable, skipping first-launch signal"),
            }
        }
        self.emit(Signal::AppOpen);

        let verdict = self.decide();
        debug!(?trigger, app_version = %self.app_version, %verdict, "evaluation finished");
        verdict
    }

    /// Read the cache and keep it only if it was written for the running
    /// app version. A stale entry is cleared as a side effect.
    pub fn load_valid_cache(&mut self) -> Option<GatePolicy> {
        let cached = match self.storage.read() {
            Ok(cached) => cached?,
            Err(e) => {
                warn!(error = %e, "policy cache unreadable, treating as miss");
                return None;
            }
        };

        if cached.is_cached_for(&self.app_version) {
            return Some(cached);
        }

        info!(
            cached_for = cached.cached_for_app_version.as_deref().unwrap_or("<none>"),
            app_version = %self.app_version,
            "discarding policy cache written for another app version"
        );
        if let Err(e) = self.storage.write(None) {
            warn!(error = %e, "failed to clear stale policy cache");
        }
        None
    }

    /// Drop the cached policy and all in-memory decision state.
    pub fn reset_cache(&mut self) {
        if let Err(e) = self.storage.write(None) {
            warn!(error = %e, "failed to clear policy cache");
        }
        self.current_policy = None;
        self.last_shown_token = None;
    }

    fn decide(&mut self) -> Verdict {
        let previous_token = self.seen_token();

        let policy = match self.fetcher.fetch_policy(&self.app_version) {
            Some(fetched) => {
                let stamped = fetched.stamped_for(&self.app_version);
                if let Err(e) = self.storage.write(Some(&stamped)) {
                    warn!(error = %e, "failed to persist fetched policy");
                }
                stamped
            }
            None => {
                debug!("policy fetch unavailable, falling back to cache");
                match self.load_valid_cache() {
                    Some(cached) => cached,
                    None => {
                        debug!("no policy available, not blocking");
                        return Verdict::NoBlock;
                    }
                }
            }
        };

        let Some(severity) = policy.blocking_severity_for(&self.app_version) else {
            self.current_policy = Some(policy);
            return Verdict::NoBlock;
        };

        let is_new_token = previous_token.as_deref() != Some(policy.last_updated_at.as_str());
        if severity != Severity::Forced && !is_new_token {
            debug!(
                %severity,
                token = %policy.last_updated_at,
                "gate already seen for this policy revision, suppressing"
            );
            self.current_policy = Some(policy);
            return Verdict::NoBlock;
        }

        info!(%severity, app_version = %self.app_version, "enforcing update gate");
        let verdict = Verdict::block(severity, &policy);
        self.last_shown_token = Some(policy.last_updated_at.clone());
        self.current_policy = Some(policy);
        self.emit(Signal::GateEnforced);
        verdict
    }

    /// Token of the last policy this install has seen, hydrating from the
    /// cache on the first evaluation after start.
    fn seen_token(&mut self) -> Option<String> {
        if self.current_policy.is_none() {
            self.current_policy = self.load_valid_cache();
        }
        self.current_policy
            .as_ref()
            .map(|policy| policy.last_updated_at.clone())
    }

    fn emit(&mut self, signal: Signal) {
        if let Err(e) = self.emitter.emit(signal.name(), &self.app_version) {
            warn!(%signal, error = %e, "signal emitter failed, dropping signal");
        }
    }
}
