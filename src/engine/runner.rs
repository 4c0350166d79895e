//! Runner: executes scheduled Jobs on a container engine connection

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::report::{CommandReport, JobReport, RunReport, TaskReport};
use crate::container::{Connection, Container, MOUNT_POINT};
use crate::context::Client;
use crate::error::{Result, StilettoError};
use crate::job::{Job, Task};
use crate::scheduler::ScheduledJobs;

#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Log every environment variable set in a task container
    pub show_env_vars: bool,
}

/// Builds a [`Runner`] from scheduled jobs.
///
/// The connection used is the first available of: the one passed to
/// [`RunnerBuilder::with_connection`], the scheduler's, or a new one opened
/// through the client's engine.
pub struct RunnerBuilder {
    scheduled: ScheduledJobs,
    explicit: Option<Box<dyn Connection>>,
    options: RunnerOptions,
}

impl RunnerBuilder {
    pub fn new(scheduled: ScheduledJobs) -> Self {
        Self { scheduled, explicit: None, options: RunnerOptions::default() }
    }

    pub fn with_connection(mut self, connection: Option<Box<dyn Connection>>) -> Self {
        self.explicit = connection;
        self
    }

    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Runner> {
        let ScheduledJobs { id: _, client, jobs, connection: scheduled } = self.scheduled;
        let span = client.span().clone();
        let _guard = span.enter();

        let connection = match (self.explicit, scheduled) {
            (Some(explicit), scheduled) => {
                debug!("runner uses the connection it was given");
                if let Some(unused) = scheduled {
                    close_connection(unused);
                }
                Some(explicit)
            }
            (None, Some(scheduled)) => {
                debug!("runner uses the scheduler connection");
                Some(scheduled)
            }
            (None, None) => match client.engine() {
                Some(engine) => {
                    let connection = engine.connect(client.cancel_token()).map_err(|e| {
                        let err = StilettoError::configuration_with(
                            "Failed to create a new container engine connection as part of this runner",
                            e,
                        );
                        error!("{}", err);
                        err
                    })?;
                    Some(connection)
                }
                None => None,
            },
        };

        Ok(Runner { id: Uuid::new_v4().to_string(), client, jobs, connection, options: self.options })
    }
}

/// Runs Jobs task by task, command by command, stopping at the first failure.
/// The connection is closed when a run ends, whatever its outcome.
pub struct Runner {
    id: String,
    client: Arc<Client>,
    jobs: Vec<Job>,
    connection: Option<Box<dyn Connection>>,
    options: RunnerOptions,
}

impl Runner {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Jobs handed over by the scheduler.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Run the jobs handed over by the scheduler.
    pub fn run_scheduled(&mut self) -> Result<RunReport> {
        let jobs = std::mem::take(&mut self.jobs);
        let result = self.run(&jobs);
        self.jobs = jobs;
        result
    }

    pub fn run(&mut self, jobs: &[Job]) -> Result<RunReport> {
        let _guard = self.client.span().enter();

        let connection = self.connection.take();
        let result = if jobs.is_empty() {
            Err(StilettoError::runner_configuration("No jobs to run"))
        } else {
            match connection.as_deref() {
                Some(conn) => self.run_jobs(conn, jobs),
                None => Err(StilettoError::runner_configuration(
                    "No container engine connection found in either the runner or the scheduler",
                )),
            }
        };

        if let Some(conn) = connection {
            close_connection(conn);
        }

        if let Err(e) = &result {
            error!("{}", e);
        }
        result
    }

    fn run_jobs(&self, connection: &dyn Connection, jobs: &[Job]) -> Result<RunReport> {
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(jobs.len());

        for job in jobs {
            if job.tasks().is_empty() {
                warn!(job = %job.name(), id = %job.id(), "job has no tasks, skipping");
                reports.push(JobReport {
                    id: job.id().to_string(),
                    name: job.name().to_string(),
                    skipped: true,
                    tasks: Vec::new(),
                });
                continue;
            }

            info!(job = %job.name(), id = %job.id(), tasks = job.tasks().len(), "running job");

            let mut tasks = Vec::with_capacity(job.tasks().len());
            for task in job.tasks() {
                tasks.push(self.run_task(connection, job, task)?);
            }

            reports.push(JobReport {
                id: job.id().to_string(),
                name: job.name().to_string(),
                skipped: false,
                tasks,
            });
        }

        Ok(RunReport { run_id: self.id.clone(), started_at, finished_at: Utc::now(), jobs: reports })
    }

    fn run_task(&self, connection: &dyn Connection, job: &Job, task: &Task) -> Result<TaskReport> {
        let cancel = self.client.cancel_token();
        let start_failed = |e: StilettoError| {
            StilettoError::task_execution_with(
                format!("Failed to run task {} with id {}", task.name(), task.id()),
                e,
            )
        };

        self.client
            .ux()
            .show_info(&format!("Running task '{}' in '{}'", task.name(), task.container_image()));

        cancel.check("mounting the task directory").map_err(start_failed)?;
        let mount_dir = task.base_dir().join(task.mount_dir());
        ensure_non_empty_dir(connection, &mount_dir, "mount").map_err(start_failed)?;

        cancel.check("creating the task container").map_err(start_failed)?;
        let mut container = connection.container_from(task.container_image()).map_err(start_failed)?;
        container.mount_directory(MOUNT_POINT, &mount_dir).map_err(start_failed)?;

        let work_dir = mount_dir.join(task.workdir());
        ensure_non_empty_dir(connection, &work_dir, "work").map_err(start_failed)?;

        self.apply_env(container.as_mut(), task).map_err(start_failed)?;

        let container_workdir = container_workdir(task.workdir());
        container.set_workdir(&container_workdir).map_err(start_failed)?;

        let mut commands = Vec::with_capacity(task.commands().len());
        for command in task.commands() {
            let run_failed = |e: StilettoError| {
                StilettoError::task_execution_with(
                    format!(
                        "Task {} with id {} in job {} failed to run",
                        task.name(),
                        task.id(),
                        job.name()
                    ),
                    e,
                )
            };

            cancel.check("running a command").map_err(run_failed)?;
            info!(task = %task.name(), command = %command, "executing command");

            let outcome = container.exec(command.argv()).map_err(run_failed)?;
            for line in outcome.stdout.lines() {
                info!(task = %task.name(), "{}", line);
            }
            for line in outcome.stderr.lines() {
                debug!(task = %task.name(), stream = "stderr", "{}", line);
            }

            if !outcome.success() {
                return Err(run_failed(StilettoError::task_execution(format!(
                    "command '{}' exited with code {}",
                    command, outcome.exit_code
                ))));
            }

            commands.push(CommandReport { command: command.to_string(), exit_code: outcome.exit_code });
        }

        self.client.ux().show_success(&format!("Task '{}' finished", task.name()));

        Ok(TaskReport {
            id: task.id().to_string(),
            name: task.name().to_string(),
            image: task.container_image().to_string(),
            workdir: container_workdir,
            env_var_count: task.env_vars().len(),
            commands,
        })
    }

    fn apply_env(&self, container: &mut dyn Container, task: &Task) -> Result<()> {
        if task.env_vars().is_empty() {
            debug!(task = %task.name(), "no env vars to set");
            return Ok(());
        }

        for (key, value) in task.env_vars() {
            container.set_env_var(key, value)?;
            if self.options.show_env_vars {
                info!(task = %task.name(), "EnvVar: {}={}", key, value);
            }
        }
        Ok(())
    }
}

fn close_connection(mut connection: Box<dyn Connection>) {
    if let Err(e) = connection.close() {
        warn!(error = %e, "failed to close the container engine connection");
    }
}

fn ensure_non_empty_dir(connection: &dyn Connection, dir: &Path, what: &str) -> Result<()> {
    let entries = connection.host_directory_entries(dir).map_err(|e| {
        StilettoError::task_execution_with(
            format!("Failed to read the {} directory {}", what, dir.display()),
            e,
        )
    })?;

    if entries.is_empty() {
        return Err(StilettoError::task_execution(format!(
            "The {} directory {} is empty",
            what,
            dir.display()
        )));
    }
    Ok(())
}

/// Path of a Task workdir inside its container.
fn container_workdir(workdir: &str) -> String {
    let trimmed = workdir.trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        MOUNT_POINT.to_string()
    } else {
        format!("{}/{}", MOUNT_POINT, trimmed)
    }
}
