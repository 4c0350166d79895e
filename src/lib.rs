//! Stiletto - run declarative task manifests as sequential container jobs
//!
//! A Task manifest names a container image, the host directories to mount,
//! the environment to build and the commands to run. Stiletto loads and
//! validates manifests, turns them into Jobs, and runs every Task's commands
//! in order on a container engine, stopping at the first failure.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stiletto::cli::{run_dagger, DaggerSettings};
//! use stiletto::container::DockerEngine;
//! use stiletto::context::Client;
//! use stiletto::output::{format_report, OutputFormat};
//!
//! let client = Client::builder().with_engine(Arc::new(DockerEngine::default())).build().unwrap();
//! let settings = DaggerSettings { task_files: vec!["tasks/plan.yml".into()], ..Default::default() };
//! let report = run_dagger(&client, &settings).unwrap();
//! println!("{}", format_report(&report, &OutputFormat::Human));
//! ```

pub mod cli;
pub mod container;
pub mod context;
pub mod engine;
pub mod env;
pub mod error;
pub mod job;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod scheduler;
pub mod validation;

pub use context::Client;
pub use engine::{RunReport, Runner, RunnerBuilder, RunnerOptions};
pub use error::{ErrorKind, Result, StilettoError};
pub use job::{Job, JobBuilder, Task};
pub use manifest::{load_task_manifest, TaskManifest};
pub use output::{format_report, OutputFormat};
pub use scheduler::{ScheduledJobs, Scheduler};
