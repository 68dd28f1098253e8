use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::time_utils::current_unix_timestamp_us;

/// Copies `source` over `destination` using a temp file + rename so readers
/// never observe a partially copied file. Returns the number of bytes copied.
pub fn copy_file_atomic(source: &Path, destination: &Path) -> Result<u64> {
    if !source.is_file() {
        bail!("source path '{}' is not a readable file", source.display());
    }
    let temp_path = prepare_temp_path(destination)?;
    let bytes = match std::fs::copy(source, &temp_path) {
        Ok(bytes) => bytes,
        Err(error) => {
            let _ = std::fs::remove_file(&temp_path);
            return Err(error).with_context(|| {
                format!(
                    "failed to copy {} to temporary file {}",
                    source.display(),
                    temp_path.display()
                )
            });
        }
    };
    commit_temp_file(&temp_path, destination)?;
    Ok(bytes)
}

fn prepare_temp_path(destination: &Path) -> Result<PathBuf> {
    if destination.as_os_str().is_empty() {
        bail!("destination path cannot be empty");
    }
    if destination.exists() && destination.is_dir() {
        bail!("destination path '{}' is a directory", destination.display());
    }

    let parent_dir = destination
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("failed to create {}", parent_dir.display()))?;

    let temp_name = format!(
        ".{}.tmp-{}-{}",
        destination
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("staged"),
        std::process::id(),
        current_unix_timestamp_us()
    );
    Ok(parent_dir.join(temp_name))
}

fn commit_temp_file(temp_path: &Path, destination: &Path) -> Result<()> {
    if let Err(error) = std::fs::rename(temp_path, destination) {
        let _ = std::fs::remove_file(temp_path);
        return Err(error).with_context(|| {
            format!(
                "failed to rename temporary file {} to {}",
                temp_path.display(),
                destination.display()
            )
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::copy_file_atomic;

    #[test]
    fn copy_file_atomic_copies_bytes_and_leaves_no_temp_files() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let source = tempdir.path().join("source.log");
        std::fs::write(&source, b"line one\nline two\n").expect("write source");
        let destination = tempdir.path().join("out").join("auth-service.log");

        let bytes = copy_file_atomic(&source, &destination).expect("copy");

        assert_eq!(bytes, 18);
        assert_eq!(
            std::fs::read(&destination).expect("read destination"),
            b"line one\nline two\n"
        );
        let leftovers = std::fs::read_dir(tempdir.path().join("out"))
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn copy_file_atomic_overwrites_existing_destination() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let source = tempdir.path().join("source.log");
        let destination = tempdir.path().join("staged.log");
        std::fs::write(&destination, b"stale content that is longer").expect("seed");
        std::fs::write(&source, b"fresh").expect("write source");

        copy_file_atomic(&source, &destination).expect("copy");

        assert_eq!(std::fs::read(&destination).expect("read"), b"fresh");
    }

    #[test]
    fn copy_file_atomic_rejects_missing_source() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let error = copy_file_atomic(
            &tempdir.path().join("missing.log"),
            &tempdir.path().join("out.log"),
        )
        .expect_err("missing source should fail");
        assert!(error.to_string().contains("is not a readable file"));
        assert!(!tempdir.path().join("out.log").exists());
    }

    #[test]
    fn copy_file_atomic_rejects_directory_destination() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let source = tempdir.path().join("source.log");
        std::fs::write(&source, b"x").expect("write source");
        let destination = tempdir.path().join("dir");
        std::fs::create_dir_all(&destination).expect("mkdir");

        let error = copy_file_atomic(&source, &destination).expect_err("directory destination");
        assert!(error.to_string().contains("is a directory"));
    }
}
