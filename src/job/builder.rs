//! Job and Task assembly

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::{Command, Job, JobArgs, Task, TaskArgs};
use crate::context::Client;
use crate::env::{EnvResolver, EnvVars, EnvVarsOptions};
use crate::error::{Result, StilettoError};
use crate::validation::validate_containment;

/// Chainable builder for a [`Job`]. The first failing step is latched and
/// every following step is skipped; [`JobBuilder::build`] returns it.
pub struct JobBuilder {
    client: Arc<Client>,
    id: String,
    state: Result<Option<Job>>,
}

impl JobBuilder {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client, id: Uuid::new_v4().to_string(), state: Ok(None) }
    }

    /// Create the Job shell and resolve the Job-level environment.
    pub fn with_job(mut self, args: JobArgs, env: EnvVarsOptions) -> Self {
        let state = std::mem::replace(&mut self.state, Ok(None));
        self.state = state.and_then(|_| self.create_job(args, &env));
        self
    }

    /// Validate and append Tasks. Either every Task is added or none is.
    pub fn with_tasks(mut self, tasks: Vec<TaskArgs>, env: EnvVarsOptions) -> Self {
        let state = std::mem::replace(&mut self.state, Ok(None));
        self.state = state.and_then(|job| match job {
            Some(mut job) => {
                if tasks.is_empty() {
                    info!(job = %job.name, id = %job.id, "no tasks provided for job, skipping");
                    return Ok(Some(job));
                }

                let built = tasks
                    .iter()
                    .map(|task| self.create_task(&job, task, &env))
                    .collect::<Result<Vec<_>>>()?;
                job.tasks.extend(built);
                Ok(Some(job))
            }
            None => Err(StilettoError::task_configuration(
                "cannot add tasks before the job is created",
            )),
        });
        self
    }

    pub fn build(self) -> Result<Job> {
        match self.state? {
            Some(job) => Ok(job),
            None => Err(StilettoError::configuration(format!(
                "job with id '{}' was never configured",
                self.id
            ))),
        }
    }

    fn create_job(&self, args: JobArgs, env: &EnvVarsOptions) -> Result<Option<Job>> {
        let _guard = self.client.span().enter();
        let dirs = self.client.dirs();

        let env_vars = EnvResolver::new(self.client.host_env(), &dirs.base_dir_abs)
            .resolve(env)
            .map_err(|e| {
                let err = StilettoError::configuration_with(
                    format!("Error decorating env vars for job '{}' with id '{}'", args.name, self.id),
                    e,
                );
                error!("{}", err);
                err
            })?;

        info!(job = %args.name, id = %self.id, "job created");

        Ok(Some(Job {
            id: self.id.clone(),
            name: args.name,
            client: Arc::clone(&self.client),
            tasks: Vec::new(),
            base_dir: dirs.base_dir.clone(),
            base_dir_abs: dirs.base_dir_abs.clone(),
            env_vars,
        }))
    }

    fn create_task(&self, job: &Job, args: &TaskArgs, env: &EnvVarsOptions) -> Result<Task> {
        let _guard = self.client.span().enter();

        self.configure_task(job, args, env).map_err(|e| {
            error!(task = %args.name, job = %job.name, "{}", e);
            e
        })
    }

    fn configure_task(&self, job: &Job, args: &TaskArgs, env: &EnvVarsOptions) -> Result<Task> {
        if args.container_image.is_empty() {
            return Err(StilettoError::task_configuration(format!(
                "The 'containerImage' argument is required for task '{}' in job '{}'",
                args.name, job.name
            )));
        }

        if Path::new(&args.workdir).is_absolute() {
            return Err(StilettoError::task_configuration(format!(
                "The 'workDir' argument cannot be an absolute path: {}",
                args.workdir
            )));
        }

        if Path::new(&args.mount_dir).is_absolute() {
            return Err(StilettoError::task_configuration(format!(
                "The 'mountDir' argument cannot be an absolute path: {}",
                args.mount_dir
            )));
        }

        let base_dir = if args.base_dir.is_empty() {
            warn!(
                task = %args.name,
                base_dir = %job.base_dir_abs.display(),
                "no base directory set for task, using the job base directory"
            );
            job.base_dir_abs.clone()
        } else {
            PathBuf::from(&args.base_dir)
        };

        if !base_dir.is_absolute() {
            return Err(StilettoError::task_configuration(format!(
                "The 'baseDir' argument must be an absolute path: {}",
                base_dir.display()
            )));
        }

        validate_containment(&base_dir.to_string_lossy(), &args.workdir, &args.mount_dir).map_err(
            |e| {
                StilettoError::task_configuration_with(
                    format!("Cannot configure task '{}' in job '{}'", args.name, job.name),
                    e,
                )
            },
        )?;

        let id = Uuid::new_v4().to_string();
        let env_vars = self.task_env(job, args, &id, &base_dir, env)?;

        let commands = args
            .commands
            .iter()
            .map(|cmd| Command::new(&cmd.binary, &cmd.args))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| {
                StilettoError::task_configuration_with(
                    format!("Error building commands for task '{}' with id '{}'", args.name, id),
                    e,
                )
            })?;

        info!(task = %args.name, id = %id, job = %job.name, "task added to job");

        Ok(Task {
            id,
            name: args.name.clone(),
            container_image: args.container_image.clone(),
            workdir: args.workdir.clone(),
            mount_dir: args.mount_dir.clone(),
            base_dir,
            env_vars,
            commands,
        })
    }

    fn task_env(
        &self,
        job: &Job,
        args: &TaskArgs,
        id: &str,
        base_dir: &Path,
        env: &EnvVarsOptions,
    ) -> Result<EnvVars> {
        if env.inherit_from_job {
            if job.env_vars.is_empty() {
                warn!(
                    task = %args.name,
                    job = %job.name,
                    "task inherits env vars from its job, but the job has none"
                );
            } else {
                info!(task = %args.name, job = %job.name, "inheriting env vars from job");
            }
            return Ok(job.env_vars.clone());
        }

        EnvResolver::new(self.client.host_env(), base_dir).resolve(env).map_err(|e| {
            StilettoError::task_configuration_with(
                format!("Error decorating env vars for task '{}' with id '{}'", args.name, id),
                e,
            )
        })
    }
}
