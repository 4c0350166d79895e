//! Task manifests
//!
//! A manifest is a YAML file declaring one Task. Loading goes through
//! [`ManifestBuilder`]: read, render template functions, parse, validate.
//! [`TaskManifest::convert`] then turns it into a Task definition for the
//! job builder.

mod builder;
mod convert;
pub mod spec;
pub mod template;

pub use builder::{load_task_manifest, ManifestBuilder, ManifestOptions};
pub use convert::ConvertedTask;
pub use spec::{
    CommandsSpec, EnvVarsScanSpec, EnvVarsScannedSpec, EnvVarsSpec, ManifestKind, TaskManifest,
    TaskMetadata, TaskSpec, API_VERSION,
};
pub use template::{render_templates, TemplateContext};
