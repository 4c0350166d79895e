//! Manifest to Task definition conversion

use super::spec::{EnvVarsScanSpec, TaskManifest};
use crate::env::{EnvVarBehaviourOptions, EnvVarsOptions};
use crate::job::{TaskArgs, TaskCommandArgs};

/// A Task definition and the environment sources it declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedTask {
    pub task: TaskArgs,
    pub env: EnvVarsOptions,
}

fn scan_options(scan: &EnvVarsScanSpec) -> EnvVarBehaviourOptions {
    if !scan.enabled {
        return EnvVarBehaviourOptions::default();
    }

    EnvVarBehaviourOptions {
        enabled: true,
        fail_if_not_set: scan.fail_if_not_set,
        required_env_vars: scan.required_env_vars.clone(),
        ignore_if_not_set_or_empty: scan.ignore_if_not_set_or_empty.clone(),
        remove_env_vars_if_found: scan.remove_env_vars_if_found.clone(),
    }
}

impl TaskManifest {
    /// Every command string of every commands entry becomes one
    /// [`TaskCommandArgs`], in order.
    pub fn convert(&self) -> ConvertedTask {
        let spec = &self.spec;

        let commands = spec
            .commands_spec
            .iter()
            .flat_map(|entry| {
                entry.commands.iter().map(move |cmd| TaskCommandArgs {
                    binary: entry.binary.clone(),
                    args: cmd.clone(),
                })
            })
            .collect();

        let env_spec = &spec.env_vars_spec;
        let scanned = &env_spec.env_vars_scanned;
        let env = EnvVarsOptions {
            inherit_from_job: false,
            aws: scan_options(&scanned.scan_aws_env_vars),
            terraform: scan_options(&scanned.scan_terraform_env_vars),
            host: EnvVarBehaviourOptions::default(),
            custom_keys: scanned.scan_custom_env_vars.clone(),
            fail_if_custom_not_set: !scanned.scan_custom_env_vars.is_empty(),
            explicit: env_spec.env_vars.clone(),
            dotfiles: env_spec.dot_files.clone(),
        };

        ConvertedTask {
            task: TaskArgs {
                name: self.metadata.name.clone(),
                container_image: spec.container_image.clone(),
                workdir: spec.workdir.clone(),
                mount_dir: spec.mount_dir.clone(),
                base_dir: spec.base_dir.clone(),
                commands,
            },
            env,
        }
    }
}
