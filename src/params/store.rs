//! Persisted parameter store
//!
//! Persist-flagged parameters are saved to a flat JSON key-value document and
//! consulted on the next run before defaults apply.

use crate::error::Result;
use crate::params::types::ParamValue;
use directories::ProjectDirs;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Default store file name inside the application's config directory
const STORE_FILE_NAME: &str = "params.json";

/// Flat JSON-backed parameter store
#[derive(Debug, Clone)]
pub struct ParamStore {
    path: PathBuf,
}

impl ParamStore {
    /// Create a store backed by a specific file
    pub fn new(path: PathBuf) -> Self {
        ParamStore { path }
    }

    /// Create a store in the platform config directory for an application
    ///
    /// Returns `None` when no home directory can be determined.
    pub fn for_app(app_name: &str) -> Option<Self> {
        ProjectDirs::from("", "", app_name)
            .map(|dirs| ParamStore::new(dirs.config_dir().join(STORE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted values; a missing file is an empty store
    pub fn load(&self) -> Result<HashMap<String, ParamValue>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        let values: HashMap<String, ParamValue> = serde_json::from_str(&contents)?;
        Ok(values)
    }

    /// Write the persisted values back, creating parent directories as needed
    pub fn save(&self, values: &BTreeMap<String, ParamValue>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
