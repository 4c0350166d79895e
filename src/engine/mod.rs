//! Execution engine
//!
//! The [`Runner`] walks scheduled Jobs and drives a container engine
//! connection; a successful run yields a [`RunReport`].

mod report;
mod runner;

pub use report::{CommandReport, JobReport, RunReport, TaskReport};
pub use runner::{Runner, RunnerBuilder, RunnerOptions};
