//! Directory configuration resolved once per process

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::error::{Result, StilettoError};
use crate::validation::{find_git_root, path_to_absolute};

/// How many parent directories are searched for a `.git` directory.
pub const GIT_SEARCH_LEVELS: usize = 20;

/// Working, home and git directories of the invoking process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirCfg {
    /// Working directory as given (`.` when taken from the process)
    pub base_dir: PathBuf,
    pub base_dir_abs: PathBuf,
    pub home_dir: PathBuf,
    pub home_dir_abs: PathBuf,
    pub is_git_repo: bool,
    /// Root of the enclosing git repository, when there is one
    pub git_dir_abs: Option<PathBuf>,
}

impl DirCfg {
    /// Resolve against the process working directory.
    pub fn resolve() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| {
            StilettoError::configuration_with("cannot resolve the current working directory", e)
        })?;

        let mut cfg = Self::from_dir(&cwd)?;
        cfg.base_dir = PathBuf::from(".");
        Ok(cfg)
    }

    /// Resolve against an explicit working directory.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let base_dir_abs = path_to_absolute(dir)?;

        let home_dir = match dirs::home_dir() {
            Some(home) => home,
            None => {
                warn!("home directory could not be determined, falling back to the working directory");
                base_dir_abs.clone()
            }
        };
        let home_dir_abs = path_to_absolute(&home_dir)?;

        let git_dir_abs = find_git_root(&base_dir_abs, GIT_SEARCH_LEVELS);

        Ok(Self {
            base_dir: dir.to_path_buf(),
            base_dir_abs,
            home_dir,
            home_dir_abs,
            is_git_repo: git_dir_abs.is_some(),
            git_dir_abs,
        })
    }
}
