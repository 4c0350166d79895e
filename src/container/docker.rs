//! `docker` CLI adapter
//!
//! Every `exec` is one `docker run --rm` with the container's mounts,
//! working directory and environment. A mounted host directory is copied
//! into a staging directory first, so commands never write to the host
//! tree. Later execs of the same container see earlier writes.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{Connection, Container, ContainerEngine, ExecOutcome};
use crate::context::CancelToken;
use crate::error::{Result, StilettoError};

/// Settings of the docker adapter.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    /// Path or name of the docker binary
    pub binary: PathBuf,
    /// How often a running container is checked for exit or cancellation
    pub poll_interval: Duration,
}

impl Default for DockerEngine {
    fn default() -> Self {
        Self { binary: PathBuf::from("docker"), poll_interval: Duration::from_millis(100) }
    }
}

impl DockerEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into(), ..Self::default() }
    }
}

impl ContainerEngine for DockerEngine {
    fn name(&self) -> &str {
        "docker"
    }

    fn connect(&self, cancel: &CancelToken) -> Result<Box<dyn Connection>> {
        let output = Command::new(&self.binary)
            .args(["version", "--format", "{{.Server.Version}}"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                StilettoError::configuration_with(
                    format!("cannot run the docker binary '{}'", self.binary.display()),
                    e,
                )
            })?;

        if !output.status.success() {
            return Err(StilettoError::configuration(format!(
                "the docker daemon is not reachable: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!(
            server_version = %String::from_utf8_lossy(&output.stdout).trim(),
            "connected to docker"
        );

        Ok(Box::new(DockerConnection {
            binary: self.binary.clone(),
            poll_interval: self.poll_interval,
            cancel: cancel.clone(),
            closed: false,
        }))
    }
}

/// A docker "connection". Docker has no session, so this only carries settings.
#[derive(Debug)]
pub struct DockerConnection {
    binary: PathBuf,
    poll_interval: Duration,
    cancel: CancelToken,
    closed: bool,
}

impl Connection for DockerConnection {
    fn container_from(&self, image: &str) -> Result<Box<dyn Container>> {
        if self.closed {
            return Err(StilettoError::configuration("the docker connection is closed"));
        }

        Ok(Box::new(DockerContainer {
            binary: self.binary.clone(),
            poll_interval: self.poll_interval,
            cancel: self.cancel.clone(),
            image: image.to_string(),
            mounts: Vec::new(),
            env: Vec::new(),
            workdir: None,
        }))
    }

    fn host_directory_entries(&self, path: &Path) -> Result<Vec<String>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            entries.push(entry?.file_name().to_string_lossy().to_string());
        }
        entries.sort();
        Ok(entries)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        debug!("docker connection closed");
        Ok(())
    }
}

/// Container configuration replayed on each `docker run`.
#[derive(Debug)]
pub struct DockerContainer {
    binary: PathBuf,
    poll_interval: Duration,
    cancel: CancelToken,
    image: String,
    mounts: Vec<(String, TempDir)>,
    env: Vec<(String, String)>,
    workdir: Option<String>,
}

impl DockerContainer {
    /// Arguments passed to the docker binary for `argv`.
    pub fn run_args(&self, argv: &[String]) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];

        for (path, staged) in &self.mounts {
            args.push("-v".to_string());
            args.push(format!("{}:{}", staged.path().display(), path));
        }

        if let Some(workdir) = &self.workdir {
            args.push("-w".to_string());
            args.push(workdir.clone());
        }

        for (key, value) in &self.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }

        args.push(self.image.clone());
        args.extend(argv.iter().cloned());
        args
    }

    fn wait(&self, mut child: Child) -> Result<ExecOutcome> {
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = loop {
            if self.cancel.is_cancelled() {
                child.kill()?;
                child.wait()?;
                return Err(StilettoError::task_execution("command cancelled"));
            }
            match child.try_wait()? {
                Some(status) => break status,
                None => thread::sleep(self.poll_interval),
            }
        };

        let collect = |handle: Option<thread::JoinHandle<String>>| {
            handle.and_then(|h| h.join().ok()).unwrap_or_default()
        };

        Ok(ExecOutcome {
            exit_code: status.code().unwrap_or(-1),
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

/// Copy the tree under `from` into `to`, which must exist.
fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| StilettoError::task_execution(format!("cannot stage '{}': {}", entry.path().display(), e)))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).to_string()
    })
}

impl Container for DockerContainer {
    fn mount_directory(&mut self, path: &str, host_dir: &Path) -> Result<()> {
        let staged = tempfile::Builder::new().prefix("stiletto-mount-").tempdir()?;
        copy_tree(host_dir, staged.path()).map_err(|e| {
            StilettoError::task_execution_with(format!("cannot copy '{}' into the container", host_dir.display()), e)
        })?;
        debug!(host_dir = %host_dir.display(), staged = %staged.path().display(), "mount directory staged");

        self.mounts.retain(|(p, _)| p != path);
        self.mounts.push((path.to_string(), staged));
        Ok(())
    }

    fn set_env_var(&mut self, key: &str, value: &str) -> Result<()> {
        self.env.retain(|(k, _)| k != key);
        self.env.push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn set_workdir(&mut self, path: &str) -> Result<()> {
        self.workdir = Some(path.to_string());
        Ok(())
    }

    fn exec(&mut self, argv: &[String]) -> Result<ExecOutcome> {
        if argv.is_empty() {
            return Err(StilettoError::argument("cannot execute an empty command"));
        }

        let args = self.run_args(argv);
        debug!(binary = %self.binary.display(), args = ?args, "running container");

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                StilettoError::task_execution_with(
                    format!("cannot start '{}'", self.binary.display()),
                    e,
                )
            })?;

        self.wait(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> DockerContainer {
        DockerContainer {
            binary: PathBuf::from("docker"),
            poll_interval: Duration::from_millis(10),
            cancel: CancelToken::new(),
            image: "alpine:3.19".to_string(),
            mounts: Vec::new(),
            env: Vec::new(),
            workdir: None,
        }
    }

    #[test]
    fn test_run_args_layout() {
        let host = TempDir::new().unwrap();
        let mut c = container();
        c.mount_directory("/mnt", host.path()).unwrap();
        c.set_workdir("/mnt/app").unwrap();
        c.set_env_var("A", "1").unwrap();
        c.set_env_var("A", "2").unwrap();

        let staged = format!("{}:/mnt", c.mounts[0].1.path().display());
        let args = c.run_args(&["ls".to_string(), "-la".to_string()]);
        assert_eq!(
            args,
            vec!["run", "--rm", "-v", staged.as_str(), "-w", "/mnt/app", "-e", "A=2", "alpine:3.19", "ls", "-la"]
        );
    }

    #[test]
    fn test_mount_copies_host_directory() {
        let host = TempDir::new().unwrap();
        std::fs::create_dir_all(host.path().join("app/modules")).unwrap();
        std::fs::write(host.path().join("main.tf"), "root").unwrap();
        std::fs::write(host.path().join("app/modules/vpc.tf"), "vpc").unwrap();

        let mut c = container();
        c.mount_directory("/mnt", host.path()).unwrap();
        let staged = c.mounts[0].1.path().to_path_buf();
        assert_ne!(staged, host.path());
        assert_eq!(std::fs::read_to_string(staged.join("main.tf")).unwrap(), "root");
        assert_eq!(std::fs::read_to_string(staged.join("app/modules/vpc.tf")).unwrap(), "vpc");

        std::fs::write(staged.join("main.tf"), "changed").unwrap();
        std::fs::write(staged.join("terraform.tfstate"), "{}").unwrap();
        assert_eq!(std::fs::read_to_string(host.path().join("main.tf")).unwrap(), "root");
        assert!(!host.path().join("terraform.tfstate").exists());

        drop(c);
        assert!(!staged.exists());
    }

    #[test]
    fn test_mount_missing_host_directory_fails() {
        let host = TempDir::new().unwrap();
        let err = container().mount_directory("/mnt", &host.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TaskExecution);
    }

    #[test]
    fn test_empty_argv_rejected() {
        assert!(container().exec(&[]).is_err());
    }

    #[test]
    fn test_missing_binary_fails_to_connect() {
        let engine = DockerEngine::new("/definitely/not/docker");
        let err = engine.connect(&CancelToken::new()).err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_host_directory_entries() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.tf"), "").unwrap();
        std::fs::write(temp.path().join("a.tf"), "").unwrap();

        let conn = DockerConnection {
            binary: PathBuf::from("docker"),
            poll_interval: Duration::from_millis(10),
            cancel: CancelToken::new(),
            closed: false,
        };
        assert_eq!(conn.host_directory_entries(temp.path()).unwrap(), vec!["a.tf", "b.tf"]);
        assert!(conn.host_directory_entries(&temp.path().join("nope")).is_err());
    }
}
