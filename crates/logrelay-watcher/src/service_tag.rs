//! Service identifiers used as staging keys and file names.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Tag reported for alert-shaped messages that carry no trailing service token.
pub const UNKNOWN_SERVICE_TAG: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceTagError {
    #[error("service tag cannot be empty")]
    Empty,
    #[error("service tag '{tag}' contains unsupported character '{character}'")]
    InvalidCharacter { tag: String, character: char },
}

/// Short service identifier restricted to `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ServiceTag(String);

impl ServiceTag {
    pub fn parse(raw: &str) -> Result<Self, ServiceTagError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ServiceTagError::Empty);
        }
        if let Some(character) = trimmed
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
        {
            return Err(ServiceTagError::InvalidCharacter {
                tag: trimmed.to_string(),
                character,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_SERVICE_TAG.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the staged copy, `<tag>.log`.
    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.0)
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
