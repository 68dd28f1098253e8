//! Service tag to source log path mapping, fixed for the lifetime of a run.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::properties::ConfigProperties;
use crate::service_tag::{ServiceTag, ServiceTagError};

#[derive(Debug, Error)]
pub enum ServiceMapError {
    #[error("failed to read properties file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid service entry '{entry}': expected <service>=<path>")]
    MalformedEntry { entry: String },
    #[error("invalid service tag in entry '{entry}': {source}")]
    InvalidTag {
        entry: String,
        #[source]
        source: ServiceTagError,
    },
    #[error("service '{tag}' has an empty log path")]
    EmptyPath { tag: String },
    #[error("service '{tag}' is configured more than once")]
    DuplicateTag { tag: String },
}

/// Parses one inline `<service>=<path>` entry.
pub fn parse_service_entry(raw: &str) -> Result<(ServiceTag, PathBuf), ServiceMapError> {
    let (tag_raw, path_raw) = raw
        .split_once('=')
        .ok_or_else(|| ServiceMapError::MalformedEntry {
            entry: raw.to_string(),
        })?;
    build_entry(raw, tag_raw, path_raw)
}

fn build_entry(
    entry: &str,
    tag_raw: &str,
    path_raw: &str,
) -> Result<(ServiceTag, PathBuf), ServiceMapError> {
    let tag = ServiceTag::parse(tag_raw).map_err(|source| ServiceMapError::InvalidTag {
        entry: entry.to_string(),
        source,
    })?;
    let path = path_raw.trim();
    if path.is_empty() {
        return Err(ServiceMapError::EmptyPath {
            tag: tag.to_string(),
        });
    }
    Ok((tag, PathBuf::from(path)))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Immutable lookup from service tag to the log file that gets staged for it.
pub struct ServiceFileMap {
    entries: BTreeMap<ServiceTag, PathBuf>,
}

impl ServiceFileMap {
    /// Builds the map from non-reserved properties, then applies inline
    /// `<service>=<path>` entries, which override properties for the same tag.
    pub fn from_sources(
        properties: &ConfigProperties,
        inline_entries: &[String],
    ) -> Result<Self, ServiceMapError> {
        let mut entries = BTreeMap::new();
        for (key, value) in properties.service_entries() {
            let (tag, path) = build_entry(&format!("{key}={value}"), key, value)?;
            entries.insert(tag, path);
        }

        let mut inline_seen = BTreeSet::new();
        for raw in inline_entries {
            let (tag, path) = parse_service_entry(raw)?;
            if !inline_seen.insert(tag.clone()) {
                return Err(ServiceMapError::DuplicateTag {
                    tag: tag.to_string(),
                });
            }
            entries.insert(tag, path);
        }

        Ok(Self { entries })
    }

    pub fn from_entries<I>(entries: I) -> Result<Self, ServiceMapError>
    where
        I: IntoIterator<Item = (ServiceTag, PathBuf)>,
    {
        let mut map = BTreeMap::new();
        for (tag, path) in entries {
            if path.as_os_str().is_empty() {
                return Err(ServiceMapError::EmptyPath {
                    tag: tag.to_string(),
                });
            }
            if map.contains_key(&tag) {
                return Err(ServiceMapError::DuplicateTag {
                    tag: tag.to_string(),
                });
            }
            map.insert(tag, path);
        }
        Ok(Self { entries: map })
    }

    pub fn resolve(&self, tag: &ServiceTag) -> Option<&Path> {
        self.entries.get(tag).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ServiceTag, &Path)> {
        self.entries.iter().map(|(tag, path)| (tag, path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
