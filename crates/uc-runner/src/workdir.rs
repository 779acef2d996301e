use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ModuleError;

pub const PROTOCOL_VERSION: &str = "3";

/// Prepares the per-invocation work directory an update module expects,
/// per the on-disk layout fixed by the module ABI.
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn prepare(
        root: &Path,
        current_artifact_name: &str,
        current_artifact_group: &str,
        current_device_type: &str,
        header_files: &BTreeMap<String, Vec<u8>>,
    ) -> Result<Self, ModuleError> {
        std::fs::create_dir_all(root)?;
        std::fs::write(root.join("version"), PROTOCOL_VERSION)?;
        std::fs::write(root.join("current_artifact_name"), current_artifact_name)?;
        std::fs::write(root.join("current_artifact_group"), current_artifact_group)?;
        std::fs::write(root.join("current_device_type"), current_device_type)?;

        let header_dir = root.join("header");
        std::fs::create_dir_all(&header_dir)?;
        for (name, contents) in header_files {
            std::fs::write(header_dir.join(name), contents)?;
        }

        std::fs::create_dir_all(root.join("streams"))?;
        std::fs::create_dir_all(root.join("files"))?;

        Ok(Self { root: root.to_path_buf() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stream_next_path(&self) -> PathBuf {
        self.root.join("stream-next")
    }

    pub fn stream_path(&self, payload_name: &str) -> PathBuf {
        self.root.join("streams").join(payload_name)
    }

    pub fn fallback_file_path(&self, payload_name: &str) -> PathBuf {
        self.root.join("files").join(payload_name)
    }

    /// Wipes the work directory after a deployment is done with it.
    pub fn cleanup(&self) -> Result<(), ModuleError> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}
