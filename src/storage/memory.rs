use crate::error::Result;
use crate::policy::{decode_policy, encode_policy, GatePolicy};
use crate::storage::{ComplianceCache, LaunchMarker};

/// In-process storage. Keeps the encoded blob rather than the struct so reads
/// go through the same decoder as the file store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blob: Option<String>,
    launched: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// Storage that has already seen a launch.
    pub fn launched() -> Self {
        MemoryStorage {
            blob: None,
            launched: true,
        }
    }

    /// Raw cached JSON, if any.
    pub fn raw(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// Overwrite the raw blob, e.g. to simulate a payload written by an older build.
    pub fn set_raw(&mut self, raw: impl Into<String>) {
        self.blob = Some(raw.into());
    }
}

impl ComplianceCache for MemoryStorage {
    fn read(&self) -> Result<Option<GatePolicy>> {
        Ok(self.blob.as_deref().map(decode_policy))
    }

    fn write(&mut self, policy: Option<&GatePolicy>) -> Result<()> {
        self.blob = policy.map(encode_policy).transpose()?;
        Ok(())
    }
}

impl LaunchMarker for MemoryStorage {
    fn take_first_launch(&mut self) -> Result<bool> {
        let first = !self.launched;
        self.launched = true;
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::GateType;

    #[test]
    fn test_memory_slot() {
        let mut storage = MemoryStorage::new();
        assert!(storage.read().unwrap().is_none());

        let policy = GatePolicy::server_computed(GateType::Dismissable, "t").stamped_for("1.0");
        storage.write(Some(&policy)).unwrap();
        assert_eq!(storage.read().unwrap(), Some(policy));
        assert!(storage.raw().unwrap().contains("\"cachedForAppVersion\":\"1.0\""));

        storage.write(None).unwrap();
        assert!(storage.raw().is_none());
    }

    #[test]
    fn test_memory_launch_marker() {
        let mut storage = MemoryStorage::new();
        assert!(storage.take_first_launch().unwrap());
        assert!(!storage.take_first_launch().unwrap());
        assert!(!MemoryStorage::launched().take_first_launch().unwrap());
    }
}
