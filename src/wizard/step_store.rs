use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::steps::WizardStep;

/// Local record of the last wizard step viewed per draft.
///
/// Only used to resume a session; a missing or corrupt file is treated as empty.
#[derive(Debug, Clone)]
pub struct StepStore {
    path: PathBuf,
}

impl StepStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, key: &str) -> Option<WizardStep> {
        self.read_all().get(key).copied()
    }

    pub fn remember(&self, key: &str, step: WizardStep) -> Result<()> {
        let mut steps = self.read_all();
        steps.insert(key.to_string(), step);
        self.write_all(&steps)?;
        debug!("Remembered {} for draft {}", step, key);
        Ok(())
    }

    pub fn forget(&self, key: &str) -> Result<()> {
        let mut steps = self.read_all();
        if steps.remove(key).is_some() {
            self.write_all(&steps)?;
        }
        Ok(())
    }

    fn read_all(&self) -> BTreeMap<String, WizardStep> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return BTreeMap::new(),
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring unreadable step store {}: {}", self.path.display(), e);
            BTreeMap::new()
        })
    }

    fn write_all(&self, steps: &BTreeMap<String, WizardStep>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(steps)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write step store {}", self.path.display()))
    }
}
