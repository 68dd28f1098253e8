//! `.properties` configuration files: `key=value` lines with `#` comments.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::service_map::ServiceMapError;

/// Keys that carry credentials or channel settings rather than service log paths.
pub const RESERVED_PROPERTY_KEYS: &[&str] = &[
    "SLACK_BOT_TOKEN",
    "SLACK_APP_TOKEN",
    "SLACK_CHANNEL",
    "CHANNEL_ID",
    "GOOGLE_API_KEY",
    "AUTHORIZED_USERS",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Merged key/value pairs from one or more `.properties` files.
pub struct ConfigProperties {
    values: BTreeMap<String, String>,
}

impl ConfigProperties {
    pub fn parse(raw: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').unwrap_or((line, ""));
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self { values }
    }

    /// Loads `paths` in order; later files override keys from earlier ones.
    pub fn load_files(paths: &[PathBuf]) -> Result<Self, ServiceMapError> {
        let mut merged = Self::default();
        for path in paths {
            merged.merge(Self::load_file(path)?);
        }
        Ok(merged)
    }

    pub fn load_file(path: &Path) -> Result<Self, ServiceMapError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ServiceMapError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&raw))
    }

    pub fn merge(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    /// Returns the value for `key` when it is present and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// First non-empty value among `keys`.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// Entries that are not reserved keys, i.e. service tag to log path mappings.
    pub fn service_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .filter(|(key, _)| !RESERVED_PROPERTY_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}
