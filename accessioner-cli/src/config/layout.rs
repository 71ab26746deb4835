//! Folder layout of the shared network drive

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::FolderConfig;

/// Name of the run lock file inside the logs folder
pub const LOCK_FILE_NAME: &str = ".accessioner.lock";

/// Resolved folders the pipeline reads from and writes into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    /// Incoming spreadsheets
    pub network: PathBuf,
    pub logs: PathBuf,
    pub complete: PathBuf,
    pub errors: PathBuf,
    pub outputs: PathBuf,
    pub backups: PathBuf,
}

impl FolderLayout {
    /// Conventional layout: every destination is a subfolder of `network`
    pub fn under(network: &Path) -> Self {
        Self {
            network: network.to_path_buf(),
            logs: network.join("logs"),
            complete: network.join("complete"),
            errors: network.join("errors"),
            outputs: network.join("outputs"),
            backups: network.join("backups"),
        }
    }

    /// Layout from configuration, applying per-folder overrides
    pub fn from_config(folders: &FolderConfig) -> Result<Self> {
        let network = folders.network.as_deref().context(
            "No network folder configured. Set [folders] network or ACCESSIONER_NETWORK_FOLDER.",
        )?;

        let mut layout = Self::under(network);
        if let Some(p) = &folders.logs {
            layout.logs = p.clone();
        }
        if let Some(p) = &folders.complete {
            layout.complete = p.clone();
        }
        if let Some(p) = &folders.errors {
            layout.errors = p.clone();
        }
        if let Some(p) = &folders.outputs {
            layout.outputs = p.clone();
        }
        if let Some(p) = &folders.backups {
            layout.backups = p.clone();
        }
        Ok(layout)
    }

    /// Check the network folder is reachable and create destination folders
    pub fn ensure(&self) -> Result<()> {
        if !self.network.is_dir() {
            anyhow::bail!(
                "Network folder is not accessible: {}",
                self.network.display()
            );
        }

        for dir in self.destinations() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create folder: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Destination folders, in display order
    pub fn destinations(&self) -> [&Path; 5] {
        [
            &self.logs,
            &self.complete,
            &self.errors,
            &self.outputs,
            &self.backups,
        ]
    }

    pub fn lock_file(&self) -> PathBuf {
        self.logs.join(LOCK_FILE_NAME)
    }
}
