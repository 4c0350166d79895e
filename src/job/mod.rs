//! Jobs and Tasks
//!
//! A [`Job`] groups the [`Task`]s built from manifests. Tasks are produced by
//! [`JobBuilder`] from [`TaskArgs`] and are immutable once built.

mod builder;
pub mod commands;

pub use builder::JobBuilder;
pub use commands::{split_command_line, Command};

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::context::Client;
use crate::env::EnvVars;

/// Arguments for a new Job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobArgs {
    pub name: String,
}

/// One command of a Task definition: an optional binary and the command string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskCommandArgs {
    pub binary: String,
    pub args: String,
}

/// Task definition, before validation and environment resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskArgs {
    pub name: String,
    pub container_image: String,
    pub workdir: String,
    pub mount_dir: String,
    /// Empty means the Job's base directory
    pub base_dir: String,
    pub commands: Vec<TaskCommandArgs>,
}

/// A validated unit of work: one image, its directories, its environment and
/// the commands to run in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) container_image: String,
    pub(crate) workdir: String,
    pub(crate) mount_dir: String,
    pub(crate) base_dir: PathBuf,
    #[serde(skip)]
    pub(crate) env_vars: EnvVars,
    pub(crate) commands: Vec<Command>,
}

impl Task {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container_image(&self) -> &str {
        &self.container_image
    }

    pub fn workdir(&self) -> &str {
        &self.workdir
    }

    pub fn mount_dir(&self) -> &str {
        &self.mount_dir
    }

    /// Absolute base directory the mount directory is relative to.
    pub fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    pub fn env_vars(&self) -> &EnvVars {
        &self.env_vars
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Convert back into the definition the Task was built from.
    pub fn to_args(&self) -> TaskArgs {
        TaskArgs {
            name: self.name.clone(),
            container_image: self.container_image.clone(),
            workdir: self.workdir.clone(),
            mount_dir: self.mount_dir.clone(),
            base_dir: self.base_dir.to_string_lossy().to_string(),
            commands: self
                .commands
                .iter()
                .map(|c| TaskCommandArgs { binary: c.binary().to_string(), args: c.raw().to_string() })
                .collect(),
        }
    }
}

impl From<&Task> for TaskArgs {
    fn from(task: &Task) -> Self {
        task.to_args()
    }
}

/// A named, ordered group of Tasks sharing a base directory.
#[derive(Debug, Clone)]
pub struct Job {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) client: Arc<Client>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) base_dir: PathBuf,
    pub(crate) base_dir_abs: PathBuf,
    pub(crate) env_vars: EnvVars,
}

impl Job {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    pub fn base_dir_abs(&self) -> &std::path::Path {
        &self.base_dir_abs
    }

    pub fn env_vars(&self) -> &EnvVars {
        &self.env_vars
    }
}
