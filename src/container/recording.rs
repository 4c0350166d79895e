//! Recording engine test double
//!
//! Records every call made through it and answers `exec` with scripted exit
//! codes. Clones share the same log, so a test can keep one handle while the
//! client owns another.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::info;

use super::{Connection, Container, ContainerEngine, ExecOutcome};
use crate::context::CancelToken;
use crate::error::{Result, StilettoError};

/// A call made against the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Connect,
    ContainerFrom { image: String },
    Mount { path: String, host_dir: PathBuf },
    SetEnv { key: String, value: String },
    SetWorkdir { path: String },
    Exec { argv: Vec<String> },
    Close,
}

#[derive(Debug, Default)]
struct Log {
    actions: Vec<Action>,
    /// Command line substring -> exit code
    exit_codes: Vec<(String, i32)>,
    entries: BTreeMap<PathBuf, Vec<String>>,
    refuse_connect: bool,
}

/// In-memory engine. Host directories are read from disk unless overridden
/// with [`RecordingEngine::with_entries`].
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    log: Arc<Mutex<Log>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Commands whose line contains `pattern` exit with `code`.
    pub fn with_exit_code(self, pattern: impl Into<String>, code: i32) -> Self {
        self.lock().exit_codes.push((pattern.into(), code));
        self
    }

    /// Report `entries` for `path` instead of reading the directory.
    pub fn with_entries(self, path: impl Into<PathBuf>, entries: Vec<String>) -> Self {
        self.lock().entries.insert(path.into(), entries);
        self
    }

    /// Make every `connect` fail.
    pub fn refusing_connections(self) -> Self {
        self.lock().refuse_connect = true;
        self
    }

    /// Every action recorded so far, in order.
    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    /// The argument vectors of every executed command.
    pub fn executed(&self) -> Vec<Vec<String>> {
        self.lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Exec { argv } => Some(argv.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: Action) {
        self.lock().actions.push(action);
    }
}

impl ContainerEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn connect(&self, cancel: &CancelToken) -> Result<Box<dyn Connection>> {
        if self.lock().refuse_connect {
            return Err(StilettoError::configuration("the recording engine refused the connection"));
        }
        self.record(Action::Connect);
        Ok(Box::new(RecordingConnection { engine: self.clone(), cancel: cancel.clone() }))
    }
}

struct RecordingConnection {
    engine: RecordingEngine,
    cancel: CancelToken,
}

impl Connection for RecordingConnection {
    fn container_from(&self, image: &str) -> Result<Box<dyn Container>> {
        self.engine.record(Action::ContainerFrom { image: image.to_string() });
        Ok(Box::new(RecordingContainer { engine: self.engine.clone(), cancel: self.cancel.clone() }))
    }

    fn host_directory_entries(&self, path: &Path) -> Result<Vec<String>> {
        if let Some(entries) = self.engine.lock().entries.get(path) {
            return Ok(entries.clone());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            entries.push(entry?.file_name().to_string_lossy().to_string());
        }
        entries.sort();
        Ok(entries)
    }

    fn close(&mut self) -> Result<()> {
        self.engine.record(Action::Close);
        Ok(())
    }
}

struct RecordingContainer {
    engine: RecordingEngine,
    cancel: CancelToken,
}

impl Container for RecordingContainer {
    fn mount_directory(&mut self, path: &str, host_dir: &Path) -> Result<()> {
        self.engine.record(Action::Mount { path: path.to_string(), host_dir: host_dir.to_path_buf() });
        Ok(())
    }

    fn set_env_var(&mut self, key: &str, value: &str) -> Result<()> {
        self.engine.record(Action::SetEnv { key: key.to_string(), value: value.to_string() });
        Ok(())
    }

    fn set_workdir(&mut self, path: &str) -> Result<()> {
        self.engine.record(Action::SetWorkdir { path: path.to_string() });
        Ok(())
    }

    fn exec(&mut self, argv: &[String]) -> Result<ExecOutcome> {
        self.cancel.check("exec")?;

        let line = argv.join(" ");
        info!(command = %line, "recorded command");
        self.engine.record(Action::Exec { argv: argv.to_vec() });

        let exit_code = self
            .engine
            .lock()
            .exit_codes
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);

        Ok(ExecOutcome { exit_code, stdout: String::new(), stderr: String::new() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        let engine = RecordingEngine::new().with_exit_code("plan", 2);
        let mut conn = engine.connect(&CancelToken::new()).unwrap();
        let mut container = conn.container_from("alpine").unwrap();
        container.mount_directory("/mnt", Path::new("/host")).unwrap();
        container.set_env_var("A", "1").unwrap();
        container.set_workdir("/mnt/app").unwrap();

        let ok = container.exec(&["terraform".to_string(), "init".to_string()]).unwrap();
        let failed = container.exec(&["terraform".to_string(), "plan".to_string()]).unwrap();
        conn.close().unwrap();

        assert!(ok.success());
        assert_eq!(failed.exit_code, 2);
        assert_eq!(engine.executed().len(), 2);
        assert_eq!(engine.actions().first(), Some(&Action::Connect));
        assert_eq!(engine.actions().last(), Some(&Action::Close));
    }

    #[test]
    fn test_entries_override_and_refusal() {
        let engine = RecordingEngine::new().with_entries("/virtual", vec!["main.tf".to_string()]);
        let conn = engine.connect(&CancelToken::new()).unwrap();
        assert_eq!(conn.host_directory_entries(Path::new("/virtual")).unwrap(), vec!["main.tf"]);

        let refusing = RecordingEngine::new().refusing_connections();
        assert!(refusing.connect(&CancelToken::new()).is_err());
    }

    #[test]
    fn test_cancelled_exec_fails() {
        let engine = RecordingEngine::new();
        let cancel = CancelToken::new();
        let conn = engine.connect(&cancel).unwrap();
        let mut container = conn.container_from("alpine").unwrap();
        cancel.cancel();
        assert!(container.exec(&["ls".to_string()]).is_err());
        assert!(engine.executed().is_empty());
    }
}
