use crate::config::Config;
use crate::error::{Error, Result};
use crate::policy::{decode_policy, encode_policy, GatePolicy};
use crate::storage::{ComplianceCache, LaunchMarker};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File-based storage for the policy cache and launch marker.
///
/// Files:
/// - `policy.json`: cached policy in wire JSON shape
/// - `policy.json.tmp`: temporary file for atomic writes
/// - `launched`: empty marker created on the first launch
pub struct FileStorage {
    policy_path: PathBuf,
    policy_tmp_path: PathBuf,
    marker_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with paths from config
    pub fn new(config: &Config) -> Self {
        FileStorage::with_paths(config.policy_cache_path(), config.launch_marker_path())
    }

    /// Create FileStorage with custom paths (for testing)
    pub fn with_paths(policy_path: PathBuf, marker_path: PathBuf) -> Self {
        let policy_tmp_path = policy_path.with_extension("json.tmp");
        FileStorage {
            policy_path,
            policy_tmp_path,
            marker_path,
        }
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create data directory: {}", e)))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.policy_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("Failed to remove policy cache: {}", e))),
        }
    }
}

impl ComplianceCache for FileStorage {
    fn read(&self) -> Result<Option<GatePolicy>> {
        let raw = match fs::read_to_string(&self.policy_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Storage(format!("Failed to read policy cache: {}", e)));
            }
        };

        Ok(Some(decode_policy(&raw)))
    }

    fn write(&mut self, policy: Option<&GatePolicy>) -> Result<()> {
        let Some(policy) = policy else {
            return self.clear();
        };

        self.ensure_dir(&self.policy_path)?;
        let encoded = encode_policy(policy)?;

        let mut file = File::create(&self.policy_tmp_path)
            .map_err(|e| Error::Storage(format!("Failed to create temp policy file: {}", e)))?;
        file.write_all(encoded.as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to write policy: {}", e)))?;

        // Fsync before rename so a crash never leaves a torn cache
        file.sync_all()
            .map_err(|e| Error::Storage(format!("Failed to fsync temp policy file: {}", e)))?;
        drop(file);

        fs::rename(&self.policy_tmp_path, &self.policy_path)
            .map_err(|e| Error::Storage(format!("Failed to rename temp policy file: {}", e)))?;

        Ok(())
    }
}

impl LaunchMarker for FileStorage {
    fn take_first_launch(&mut self) -> Result<bool> {
        if self.marker_path.exists() {
            return Ok(false);
        }

        self.ensure_dir(&self.marker_path)?;
        File::create(&self.marker_path)
            .map_err(|e| Error::Storage(format!("Failed to create launch marker: {}", e)))?;
        Ok(true)
    }
}
