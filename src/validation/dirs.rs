//! Base / mount / work directory containment rules

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, StilettoError};

/// Check that `path` exists and is a directory.
pub fn is_valid_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StilettoError::argument(format!(
            "{} is not a directory",
            path.display()
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StilettoError::argument_with(
            format!("directory {} does not exist", path.display()),
            e,
        )),
        Err(e) => Err(StilettoError::argument_with(
            format!("error checking the path {}", path.display()),
            e,
        )),
    }
}

/// Validate a single directory argument.
pub fn dir_is_valid(dir: &str) -> Result<()> {
    if dir.is_empty() {
        return Err(StilettoError::argument(
            "The 'dir' argument is required. It can be defined or set as '.' to use the current directory.",
        ));
    }

    is_valid_dir(Path::new(dir))
        .map_err(|e| StilettoError::argument_with(format!("Invalid directory passed: {}", dir), e))
}

/// Make `path` absolute against the process working directory, without
/// touching the filesystem beyond reading the cwd.
pub fn path_to_absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let cwd = std::env::current_dir().map_err(|e| {
        StilettoError::argument_with(
            format!("error converting path {} to absolute path", path.display()),
            e,
        )
    })?;

    Ok(cwd.join(path))
}

/// Validate that `mount_dir` and `work_dir` are relative, that `base_dir` is
/// absolute, and that both `base_dir/mount_dir` and
/// `base_dir/mount_dir/work_dir` are existing directories.
///
/// A `base_dir` of `"."` resolves to the process working directory.
pub fn validate_containment(base_dir: &str, work_dir: &str, mount_dir: &str) -> Result<()> {
    if base_dir.is_empty() {
        return Err(StilettoError::argument(
            "The 'baseDir' argument is required. It can be defined or set as '.' to use the current directory.",
        ));
    }

    if work_dir.is_empty() {
        return Err(StilettoError::argument(
            "The 'workDir' argument is required. It can be defined or set as '.' to use the current directory.",
        ));
    }

    if mount_dir.is_empty() {
        return Err(StilettoError::argument(
            "The 'mountDir' argument is required. It can be defined or set as '.' to use the current directory.",
        ));
    }

    if Path::new(work_dir).is_absolute() {
        return Err(StilettoError::argument(format!(
            "The 'workDir' argument cannot be an absolute path: {}",
            work_dir
        )));
    }

    if Path::new(mount_dir).is_absolute() {
        return Err(StilettoError::argument(format!(
            "The 'mountDir' argument cannot be an absolute path: {}",
            mount_dir
        )));
    }

    let base = if base_dir == "." {
        path_to_absolute(Path::new(""))?
    } else {
        PathBuf::from(base_dir)
    };

    if !base.is_absolute() {
        return Err(StilettoError::argument(format!(
            "The 'baseDir' argument must be an absolute path: {}",
            base_dir
        )));
    }

    let mount_full = base.join(mount_dir);
    is_valid_dir(&mount_full)
        .map_err(|e| StilettoError::argument_with("Invalid mountdir passed", e))?;

    let work_full = mount_full.join(work_dir);
    is_valid_dir(&work_full)
        .map_err(|e| StilettoError::argument_with("Invalid workdir passed", e))?;

    Ok(())
}

/// Walk up from `start` at most `levels` directories looking for a `.git`
/// directory. Returns the repository root.
pub fn find_git_root(start: &Path, levels: usize) -> Option<PathBuf> {
    let mut current = path_to_absolute(start).ok()?;

    for _ in 0..levels {
        if current.join(".git").is_dir() {
            return Some(current);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn base_with(dirs: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for d in dirs {
            fs::create_dir_all(temp.path().join(d)).unwrap();
        }
        temp
    }

    fn base_str(temp: &TempDir) -> String {
        temp.path().to_string_lossy().to_string()
    }

    #[test]
    fn test_valid_triple() {
        let temp = base_with(&["infra/app"]);
        assert!(validate_containment(&base_str(&temp), "app", "infra").is_ok());
        assert!(validate_containment(&base_str(&temp), ".", ".").is_ok());
    }

    #[test]
    fn test_missing_fields() {
        let err = validate_containment("", "app", ".").unwrap_err();
        assert!(err.to_string().contains("baseDir"));
        let err = validate_containment("/tmp", "", ".").unwrap_err();
        assert!(err.to_string().contains("workDir"));
        let err = validate_containment("/tmp", ".", "").unwrap_err();
        assert!(err.to_string().contains("mountDir"));
    }

    #[test]
    fn test_absolute_work_or_mount_always_fails() {
        let temp = base_with(&["app"]);
        let base = base_str(&temp);
        let abs = temp.path().join("app").to_string_lossy().to_string();

        let err = validate_containment(&base, &abs, ".").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert!(err.to_string().contains("cannot be an absolute path"));

        let err = validate_containment(&base, ".", &abs).unwrap_err();
        assert!(err.to_string().contains("'mountDir' argument cannot be an absolute path"));
    }

    #[test]
    fn test_relative_base_fails() {
        let err = validate_containment("relative/base", ".", ".").unwrap_err();
        assert!(err.to_string().contains("must be an absolute path"));
    }

    #[test]
    fn test_dot_base_resolves_to_cwd() {
        assert!(validate_containment(".", ".", ".").is_ok());
    }

    #[test]
    fn test_missing_mount_and_work() {
        let temp = base_with(&["infra"]);
        let base = base_str(&temp);

        let err = validate_containment(&base, ".", "nope").unwrap_err();
        assert!(err.to_string().contains("Invalid mountdir passed"));

        let err = validate_containment(&base, "nope", "infra").unwrap_err();
        assert!(err.to_string().contains("Invalid workdir passed"));
        assert!(err.has_kind(ErrorKind::Io));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let temp = base_with(&[]);
        fs::write(temp.path().join("file.txt"), "x").unwrap();
        let err = validate_containment(&base_str(&temp), ".", "file.txt").unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_idempotent() {
        let temp = base_with(&["a/b"]);
        let base = base_str(&temp);
        let first = validate_containment(&base, "b", "a").is_ok();
        let second = validate_containment(&base, "b", "a").is_ok();
        assert_eq!(first, second);

        let first = validate_containment(&base, "x", "a").unwrap_err().to_string();
        let second = validate_containment(&base, "x", "a").unwrap_err().to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dir_is_valid() {
        let temp = base_with(&[]);
        assert!(dir_is_valid(&base_str(&temp)).is_ok());
        assert!(dir_is_valid("").is_err());
        assert!(dir_is_valid("/definitely/not/here").is_err());
    }

    #[test]
    fn test_find_git_root() {
        let temp = base_with(&[".git", "nested/deeper"]);
        let root = find_git_root(&temp.path().join("nested/deeper"), 10).unwrap();
        assert_eq!(root, temp.path());
        assert!(find_git_root(&temp.path().join("nested/deeper"), 1).is_none());
    }
}
