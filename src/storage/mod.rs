pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;
use crate::policy::GatePolicy;

/// Single-slot store for the last known policy.
///
/// Implementations must preserve:
/// - Durability across process restarts (for the file-backed store)
/// - Last-writer-wins: a write fully replaces the slot
/// - Writing `None` clears the slot
pub trait ComplianceCache {
    /// Load the cached policy, `None` if the slot is empty.
    fn read(&self) -> Result<Option<GatePolicy>>;

    /// Replace the cached policy, or clear it with `None`.
    fn write(&mut self, policy: Option<&GatePolicy>) -> Result<()>;
}

/// Persisted first-run flag, consumed exactly once.
pub trait LaunchMarker {
    /// Returns `true` on the first call against fresh storage and records the
    /// launch, `false` on every later call.
    fn take_first_launch(&mut self) -> Result<bool>;
}
