//! Output validation and model writing.
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::PosModel;

fn invalid_output(label: &str, path: &Path, reason: &str) -> Error {
    Error::InvalidOutputFile {
        label: label.to_string(),
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Directory a new file at `path` would be created in
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Check that `path` can receive the `label` output file.
///
/// An existing path must be a writable regular file. Otherwise its parent
/// directory must exist and be writable. Permission bits are only a first
/// filter: the file is then opened for writing (or created and removed
/// again) so that ACLs, read-only mounts and over-long names are caught
/// before any training work starts.
pub fn check_output_file(label: &str, path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) => {
            if !meta.is_file() {
                return Err(invalid_output(label, path, "not a regular file"));
            }
            if meta.permissions().readonly() {
                return Err(invalid_output(label, path, "file is read-only"));
            }
            OpenOptions::new()
                .write(true)
                .open(path)
                .map_err(|e| invalid_output(label, path, &format!("cannot open file: {}", e)))?;
            Ok(())
        }
        Err(_) => {
            let parent = parent_dir(path);
            match fs::metadata(parent) {
                Ok(meta) if !meta.is_dir() => {
                    return Err(invalid_output(label, path, "parent is not a directory"))
                }
                Ok(meta) if meta.permissions().readonly() => {
                    return Err(invalid_output(label, path, "parent directory is read-only"))
                }
                Ok(_) => {}
                Err(_) => {
                    return Err(invalid_output(label, path, "parent directory does not exist"))
                }
            }
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|e| invalid_output(label, path, &format!("cannot create file: {}", e)))?;
            fs::remove_file(path)
                .map_err(|e| invalid_output(label, path, &format!("cannot remove file: {}", e)))
        }
    }
}

/// Write `model` to `path` through a temporary file in the same directory.
pub fn write_model(label: &str, path: &Path, model: &PosModel) -> Result<()> {
    let context = || format!("writing {} model", label);
    let start = Instant::now();
    info!("Writing {} model", label);

    let bytes = model.to_bytes().map_err(|e| Error::io(context(), e))?;
    let mut file = NamedTempFile::new_in(parent_dir(path)).map_err(|e| Error::io(context(), e))?;
    file.write_all(&bytes)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| Error::io(context(), e))?;
    file.persist(path).map_err(|e| Error::io(context(), e.error))?;

    info!(
        elapsed = ?start.elapsed(),
        size = bytes.len(),
        "Wrote {} model to path: {}",
        label,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::TaggerConfiguration;
    use crate::params::TrainingParameters;
    use crate::sample::{MemorySampleStream, PosSample};
    use tempfile::tempdir;

    fn test_model() -> PosModel {
        let samples: Vec<PosSample> = ["The_DT dog_NN barks_VBZ ._.", "A_DT cat_NN runs_VBZ ._."]
            .iter()
            .map(|line| line.parse().unwrap())
            .collect();
        let mut stream = MemorySampleStream::new(samples);
        let mut settings = TrainingParameters::create(5, 0);
        settings.put("Algorithm", "PERCEPTRON");
        let config = TaggerConfiguration::create(None, None, None).unwrap();
        crate::train::train("en", &mut stream, &settings, &config).unwrap()
    }

    #[test]
    fn test_new_file_in_existing_dir() {
        let dir = tempdir().unwrap();
        assert!(check_output_file("pos tagger model", &dir.path().join("en.bin")).is_ok());
    }

    #[test]
    fn test_missing_parent_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("en.bin");
        let err = check_output_file("pos tagger model", &path).unwrap_err();
        assert!(matches!(err, Error::InvalidOutputFile { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempdir().unwrap();
        let err = check_output_file("pos tagger model", dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn test_read_only_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("en.bin");
        fs::write(&path, b"old").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();
        let err = check_output_file("pos tagger model", &path).unwrap_err();
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_new_file_check_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("en.bin");
        check_output_file("pos tagger model", &path).unwrap();
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_existing_file_is_not_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("en.bin");
        fs::write(&path, b"old").unwrap();
        check_output_file("pos tagger model", &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"old");
    }

    #[test]
    fn test_uncreatable_name_in_writable_dir() {
        // Permission bits allow it, but no file system accepts the name
        let dir = tempdir().unwrap();
        let path = dir.path().join(format!("{}.bin", "x".repeat(300)));
        let err = check_output_file("pos tagger model", &path).unwrap_err();
        assert!(matches!(err, Error::InvalidOutputFile { .. }));
        assert!(err.to_string().contains("cannot create file"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_write_model_failure_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("en.bin");
        check_output_file("pos tagger model", &path).unwrap();
        // Target turns into a directory between validation and writing
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"").unwrap();

        let model = test_model();
        let err = write_model("pos tagger", &path, &model).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("IO error while writing pos tagger model"));
        assert!(path.is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        assert_eq!(parent_dir(Path::new("en.bin")), Path::new("."));
        assert_eq!(parent_dir(Path::new("out/en.bin")), Path::new("out"));
    }
}
