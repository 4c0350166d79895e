//! Process-wide client context
//!
//! One [`Client`] is built per invocation and shared as `Arc<Client>` by the
//! manifest loader, the job builder, the scheduler and the runner. It carries
//! the cancellation token, the logging span, the resolved directories, a
//! snapshot of the host environment and the container engine to connect to.

mod cancel;
mod dirs;

pub use cancel::CancelToken;
pub use self::dirs::{DirCfg, GIT_SEARCH_LEVELS};

use std::fmt;
use std::sync::Arc;

use tracing::{info_span, Span};
use uuid::Uuid;

use crate::container::ContainerEngine;
use crate::env::{host_env_snapshot, EnvVars};
use crate::error::Result;
use crate::output::{ConsoleMessenger, UxMessenger};

/// User-facing configuration: how messages are shown.
#[derive(Clone)]
pub struct CliConfig {
    pub ux: Arc<dyn UxMessenger>,
    pub dirs: DirCfg,
}

/// Host configuration: environment snapshot taken at construction.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub env_vars: EnvVars,
    pub dirs: DirCfg,
}

/// API configuration. The token is accepted but not used by any engine yet.
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    pub client_token: Option<String>,
}

/// The process-wide context.
pub struct Client {
    id: String,
    cancel: CancelToken,
    span: Span,
    cli: CliConfig,
    host: HostConfig,
    api: ApiConfig,
    dirs: DirCfg,
    engine: Option<Arc<dyn ContainerEngine>>,
}

impl Client {
    /// Build a client from the process environment and working directory.
    pub fn new() -> Result<Arc<Self>> {
        ClientBuilder::new().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Span entered by every pipeline stage acting for this client.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn cli(&self) -> &CliConfig {
        &self.cli
    }

    pub fn ux(&self) -> &dyn UxMessenger {
        self.cli.ux.as_ref()
    }

    pub fn host(&self) -> &HostConfig {
        &self.host
    }

    pub fn host_env(&self) -> &EnvVars {
        &self.host.env_vars
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    pub fn dirs(&self) -> &DirCfg {
        &self.dirs
    }

    pub fn engine(&self) -> Option<&Arc<dyn ContainerEngine>> {
        self.engine.as_ref()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("dirs", &self.dirs)
            .field("host_env_vars", &self.host.env_vars.len())
            .field("engine", &self.engine.as_ref().map(|e| e.name()))
            .finish()
    }
}

/// Builder for [`Client`]. Anything not supplied is taken from the process.
#[derive(Default)]
pub struct ClientBuilder {
    dirs: Option<DirCfg>,
    host_env: Option<EnvVars>,
    ux: Option<Arc<dyn UxMessenger>>,
    engine: Option<Arc<dyn ContainerEngine>>,
    cancel: Option<CancelToken>,
    client_token: Option<String>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dirs(mut self, dirs: DirCfg) -> Self {
        self.dirs = Some(dirs);
        self
    }

    pub fn with_host_env(mut self, env_vars: EnvVars) -> Self {
        self.host_env = Some(env_vars);
        self
    }

    pub fn with_ux(mut self, ux: Arc<dyn UxMessenger>) -> Self {
        self.ux = Some(ux);
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn ContainerEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_client_token(mut self, token: impl Into<String>) -> Self {
        self.client_token = Some(token.into());
        self
    }

    pub fn build(self) -> Result<Arc<Client>> {
        let dirs = match self.dirs {
            Some(dirs) => dirs,
            None => DirCfg::resolve()?,
        };

        let id = Uuid::new_v4().to_string();
        let span = info_span!("client", id = %id);

        Ok(Arc::new(Client {
            cancel: self.cancel.unwrap_or_default(),
            span,
            cli: CliConfig {
                ux: self.ux.unwrap_or_else(|| Arc::new(ConsoleMessenger::default())),
                dirs: dirs.clone(),
            },
            host: HostConfig {
                env_vars: self.host_env.unwrap_or_else(host_env_snapshot),
                dirs: dirs.clone(),
            },
            api: ApiConfig { client_token: self.client_token },
            dirs,
            engine: self.engine,
            id,
        }))
    }
}
