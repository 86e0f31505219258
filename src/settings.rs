use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::context::Options;
use crate::declarations::kind_of;
use crate::errors::{Result, SettingsError};
use crate::path::{self, ConfigKey};

/// Process-wide key/value settings the registry reads from and publishes to.
///
/// Keys are dotted paths. A missing key reads as `Value::Null`.
pub trait SettingsSource: Send + Sync {
    fn read(&self, key: &str) -> Value;
    fn write(&self, key: &str, value: Value);
}

/// In-memory settings tree.
#[derive(Debug, Default)]
pub struct MemorySettings {
    tree: RwLock<Map<String, Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing tree. The root must be a mapping.
    pub fn from_value(root: Value) -> Result<Self> {
        match root {
            Value::Object(tree) => Ok(Self { tree: RwLock::new(tree) }),
            other => Err(SettingsError::NotAMapping(kind_of(&other))),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(s)?)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(s)?;
        // toml tables always serialise into JSON mappings
        let root = serde_json::to_value(table)?;
        Self::from_value(root)
    }

    /// Load a `.json` or `.toml` settings file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("toml") => Self::from_toml_str(&content)?,
            _ => return Err(SettingsError::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Registry options from the optional `registry` table.
    pub fn options(&self) -> Result<Options> {
        match self.read("registry") {
            Value::Null => Ok(Options::default()),
            raw => Ok(serde_json::from_value(raw)?),
        }
    }
}

impl SettingsSource for MemorySettings {
    fn read(&self, key: &str) -> Value {
        let tree = self.tree.read();
        path::get(&tree, &ConfigKey::from(key))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn write(&self, key: &str, value: Value) {
        let mut tree = self.tree.write();
        path::set(&mut tree, key, value);
    }
}

impl<T: SettingsSource + ?Sized> SettingsSource for Arc<T> {
    fn read(&self, key: &str) -> Value {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: Value) {
        (**self).write(key, value)
    }
}
