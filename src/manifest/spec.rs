//! Manifest schema

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::env::EnvVars;
use crate::error::StilettoError;

/// The only supported `apiVersion`.
pub const API_VERSION: &str = "v1";

/// Kinds a manifest may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ManifestKind {
    Task,
    Job,
    Workflow,
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ManifestKind::Task => "Task",
            ManifestKind::Job => "Job",
            ManifestKind::Workflow => "Workflow",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ManifestKind {
    type Err = StilettoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Task" => Ok(ManifestKind::Task),
            "Job" => Ok(ManifestKind::Job),
            "Workflow" => Ok(ManifestKind::Workflow),
            other => Err(StilettoError::manifest(format!(
                "invalid manifest kind: {}. Should be 'Job', 'Task' or 'Workflow'",
                other
            ))),
        }
    }
}

/// A Task manifest as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: TaskMetadata,
    pub spec: TaskSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskMetadata {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskSpec {
    pub container_image: String,
    pub workdir: String,
    pub mount_dir: String,
    /// Absolute; filled with the working directory when left empty
    pub base_dir: String,
    pub commands_spec: Vec<CommandsSpec>,
    pub env_vars_spec: EnvVarsSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsSpec {
    pub binary: String,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvVarsSpec {
    pub env_vars: EnvVars,
    pub env_vars_scanned: EnvVarsScannedSpec,
    pub dot_files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvVarsScannedSpec {
    #[serde(rename = "scanAWSEnvVars")]
    pub scan_aws_env_vars: EnvVarsScanSpec,
    pub scan_terraform_env_vars: EnvVarsScanSpec,
    pub scan_custom_env_vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvVarsScanSpec {
    pub enabled: bool,
    pub fail_if_not_set: bool,
    pub required_env_vars: Vec<String>,
    pub ignore_if_not_set_or_empty: Vec<String>,
    pub remove_env_vars_if_found: Vec<String>,
}
