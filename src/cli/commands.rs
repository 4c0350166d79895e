//! Subcommand pipelines
//!
//! `job dagger`: manifests -> Task definitions -> one Job per manifest ->
//! scheduler -> runner. `manifest validate` stops after loading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::context::Client;
use crate::engine::{RunReport, RunnerBuilder, RunnerOptions};
use crate::env::EnvVarsOptions;
use crate::error::{Result, StilettoError};
use crate::job::{Job, JobArgs, JobBuilder};
use crate::manifest::{load_task_manifest, ConvertedTask, TaskManifest};
use crate::scheduler::Scheduler;

/// Settings shared by every Job of a `job dagger` run.
#[derive(Debug, Clone, Default)]
pub struct DaggerSettings {
    pub task_files: Vec<PathBuf>,
    /// Replaces the workdir of every Task
    pub workdir: Option<String>,
    /// Replaces the mount directory of every Task
    pub mountdir: Option<String>,
    /// Dotfiles resolved as Job-level env vars
    pub dotfiles: Vec<String>,
    pub show_env_vars: bool,
}

/// Name of the Job built for a Task manifest.
pub fn job_name(task_name: &str) -> String {
    format!("job-task-{}", task_name)
}

/// Load every manifest and convert it, applying the directory overrides.
pub fn convert_task_files(client: &Arc<Client>, settings: &DaggerSettings) -> Result<Vec<ConvertedTask>> {
    if settings.task_files.is_empty() {
        return Err(StilettoError::argument(
            "No task files (specs, or manifests) were provided",
        ));
    }

    let mut converted = Vec::with_capacity(settings.task_files.len());
    for file in &settings.task_files {
        let manifest = load_task_manifest(client, file)?;
        let mut task = manifest.convert();
        apply_overrides(client, &mut task, file, settings);
        converted.push(task);
    }
    Ok(converted)
}

fn apply_overrides(client: &Arc<Client>, converted: &mut ConvertedTask, file: &Path, settings: &DaggerSettings) {
    let task = &mut converted.task;

    if let Some(workdir) = settings.workdir.as_deref().filter(|w| !w.is_empty()) {
        if !task.workdir.is_empty() && task.workdir != workdir {
            let msg = format!(
                "The workDir '{}' was set in the CLI, but also set in the manifest file '{}'. The CLI value will be used.",
                workdir,
                file.display()
            );
            warn!(task = %task.name, "{}", msg);
            client.ux().show_warning(&msg);
        }
        task.workdir = workdir.to_string();
    }

    if let Some(mountdir) = settings.mountdir.as_deref().filter(|m| !m.is_empty()) {
        if !task.mount_dir.is_empty() && task.mount_dir != mountdir {
            let msg = format!(
                "The mountDir '{}' was set in the CLI, but also set in the manifest file '{}'. The CLI value will be used.",
                mountdir,
                file.display()
            );
            warn!(task = %task.name, "{}", msg);
            client.ux().show_warning(&msg);
        }
        task.mount_dir = mountdir.to_string();
    }
}

/// One Job per converted Task. With Job-level dotfiles, Tasks that declared
/// no env sources of their own inherit the Job env.
pub fn build_jobs(client: &Arc<Client>, tasks: Vec<ConvertedTask>, dotfiles: &[String]) -> Result<Vec<Job>> {
    let job_env = EnvVarsOptions { dotfiles: dotfiles.to_vec(), ..Default::default() };

    tasks
        .into_iter()
        .map(|converted| {
            let mut task_env = converted.env;
            if !dotfiles.is_empty() && task_env.is_empty() {
                task_env.inherit_from_job = true;
            }

            JobBuilder::new(Arc::clone(client))
                .with_job(JobArgs { name: job_name(&converted.task.name) }, job_env.clone())
                .with_tasks(vec![converted.task], task_env)
                .build()
        })
        .collect()
}

/// Run the whole `job dagger` pipeline on the client's engine.
pub fn run_dagger(client: &Arc<Client>, settings: &DaggerSettings) -> Result<RunReport> {
    client.ux().show_title(
        "STILETTO",
        "Automated pipelines, workflows and whatever can be containerized in your own laptop",
    );

    let tasks = convert_task_files(client, settings)?;
    let jobs = build_jobs(client, tasks, &settings.dotfiles)?;
    info!(jobs = jobs.len(), "jobs built");

    let scheduled = Scheduler::new()
        .with_client(Arc::clone(client))
        .with_jobs_to_run(jobs)
        .with_engine()
        .build()?;

    let mut runner = RunnerBuilder::new(scheduled)
        .with_connection(None)
        .with_options(RunnerOptions { show_env_vars: settings.show_env_vars })
        .build()?;

    let report = runner.run_scheduled()?;
    client
        .ux()
        .show_success(&format!("{} job(s) finished", report.jobs.len()));
    Ok(report)
}

/// Load and validate each manifest. Stops at the first invalid one.
pub fn validate_manifests(client: &Arc<Client>, files: &[PathBuf]) -> Result<Vec<(PathBuf, TaskManifest)>> {
    let mut valid = Vec::with_capacity(files.len());
    for file in files {
        let manifest = load_task_manifest(client, file)?;
        client
            .ux()
            .show_success(&format!("{} is a valid '{}' manifest", file.display(), manifest.metadata.name));
        valid.push((file.clone(), manifest));
    }
    Ok(valid)
}
