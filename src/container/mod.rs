//! Container engine collaborator
//!
//! Tasks run against a container engine through three capabilities:
//! - [`ContainerEngine`] opens a [`Connection`]
//! - a [`Connection`] creates containers and lists host directories
//! - a [`Container`] is configured step by step and executes commands
//!
//! [`DockerEngine`] drives the `docker` CLI. [`RecordingEngine`] records every
//! call and answers with scripted exit codes; it backs the tests and
//! `--dry-run`.

mod docker;
mod recording;

pub use docker::{DockerConnection, DockerContainer, DockerEngine};
pub use recording::{Action, RecordingEngine};

use std::path::Path;

use serde::Serialize;

use crate::context::CancelToken;
use crate::error::Result;

/// Where a Task's mount directory appears inside its container.
pub const MOUNT_POINT: &str = "/mnt";

/// Result of one command executed in a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Something that can open connections to a container runtime.
pub trait ContainerEngine: Send + Sync {
    /// Short engine name, used in logs.
    fn name(&self) -> &str;

    /// Open a connection. Long running calls made through it observe `cancel`.
    fn connect(&self, cancel: &CancelToken) -> Result<Box<dyn Connection>>;
}

/// An open session with a container runtime.
pub trait Connection {
    fn container_from(&self, image: &str) -> Result<Box<dyn Container>>;

    /// Names of the entries of a host directory.
    fn host_directory_entries(&self, path: &Path) -> Result<Vec<String>>;

    fn close(&mut self) -> Result<()>;
}

/// A container being configured. Configuration applies to every later `exec`.
pub trait Container {
    fn mount_directory(&mut self, path: &str, host_dir: &Path) -> Result<()>;

    fn set_env_var(&mut self, key: &str, value: &str) -> Result<()>;

    fn set_workdir(&mut self, path: &str) -> Result<()>;

    fn exec(&mut self, argv: &[String]) -> Result<ExecOutcome>;
}
