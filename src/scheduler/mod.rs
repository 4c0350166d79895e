//! Job scheduling
//!
//! Binds a client, the Jobs to run and an engine connection into
//! [`ScheduledJobs`], which the runner consumes.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::container::Connection;
use crate::context::Client;
use crate::error::{Result, StilettoError};
use crate::job::Job;

/// Jobs ready to be handed to a runner.
pub struct ScheduledJobs {
    pub id: String,
    pub client: Arc<Client>,
    pub jobs: Vec<Job>,
    pub connection: Option<Box<dyn Connection>>,
}

#[derive(Default)]
struct Draft {
    client: Option<Arc<Client>>,
    jobs: Vec<Job>,
    connection: Option<Box<dyn Connection>>,
}

/// Chainable scheduler builder. The first failing step is latched.
pub struct Scheduler {
    id: String,
    state: Result<Draft>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4().to_string(), state: Ok(Draft::default()) }
    }

    pub fn with_client(mut self, client: Arc<Client>) -> Self {
        self.state = self.state.map(|mut draft| {
            draft.client = Some(client);
            draft
        });
        self
    }

    /// Requires [`Scheduler::with_client`] first.
    pub fn with_jobs_to_run(mut self, jobs: Vec<Job>) -> Self {
        self.state = self.state.and_then(|mut draft| {
            if draft.client.is_none() {
                return Err(missing_client());
            }
            draft.jobs = jobs;
            Ok(draft)
        });
        self
    }

    /// Connect through the client's container engine.
    pub fn with_engine(mut self) -> Self {
        self.state = self.state.and_then(|mut draft| {
            let client = Arc::clone(draft.client.as_ref().ok_or_else(missing_client)?);
            let _guard = client.span().enter();

            let engine = client.engine().ok_or_else(|| {
                StilettoError::configuration("No container engine is configured in the client")
            })?;

            let connection = engine.connect(client.cancel_token()).map_err(|e| {
                let err = StilettoError::configuration_with(
                    "Failed to create a new container engine connection as part of this scheduler",
                    e,
                );
                error!("{}", err);
                err
            })?;

            info!(engine = engine.name(), "scheduler connected to the container engine");
            draft.connection = Some(connection);
            Ok(draft)
        });
        self
    }

    pub fn build(self) -> Result<ScheduledJobs> {
        let draft = self.state?;
        let client = draft.client.ok_or_else(missing_client)?;

        Ok(ScheduledJobs { id: self.id, client, jobs: draft.jobs, connection: draft.connection })
    }
}

fn missing_client() -> StilettoError {
    StilettoError::configuration(
        "No client instance found. The scheduler requires a valid client; call with_client first",
    )
}
