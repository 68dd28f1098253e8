//! Copies mapped service logs into the shared staging directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use logrelay_core::copy_file_atomic;
use thiserror::Error;

use crate::service_map::ServiceFileMap;
use crate::service_tag::ServiceTag;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("no file mapped for service: {tag}")]
    Unmapped { tag: ServiceTag },
    #[error("error copying file for {tag} from {}: {detail}", source_path.display())]
    CopyFailed {
        tag: ServiceTag,
        source_path: PathBuf,
        detail: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A log file that now sits in the staging directory as `<tag>.log`.
pub struct StagedLogFile {
    pub source_path: PathBuf,
    pub staged_path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub struct LogStager {
    output_dir: PathBuf,
}

impl LogStager {
    /// Creates `output_dir` when it does not exist yet.
    pub fn new(output_dir: PathBuf) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn staged_path(&self, tag: &ServiceTag) -> PathBuf {
        self.output_dir.join(tag.log_file_name())
    }

    /// Overwrites `<output_dir>/<tag>.log` with the mapped source file.
    pub fn stage(
        &self,
        service_map: &ServiceFileMap,
        tag: &ServiceTag,
    ) -> Result<StagedLogFile, StageError> {
        let source_path = service_map
            .resolve(tag)
            .ok_or_else(|| StageError::Unmapped { tag: tag.clone() })?;
        let staged_path = self.staged_path(tag);
        let bytes = copy_file_atomic(source_path, &staged_path).map_err(|error| {
            StageError::CopyFailed {
                tag: tag.clone(),
                source_path: source_path.to_path_buf(),
                detail: format!("{error:#}"),
            }
        })?;
        Ok(StagedLogFile {
            source_path: source_path.to_path_buf(),
            staged_path,
            bytes,
        })
    }
}
