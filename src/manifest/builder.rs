//! Staged manifest loading

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use super::spec::{ManifestKind, TaskManifest, API_VERSION};
use super::template::{render_templates, TemplateContext};
use crate::context::Client;
use crate::error::{Result, StilettoError};
use crate::validation::validate_containment;

/// Inputs of a [`ManifestBuilder`].
#[derive(Debug, Clone)]
pub struct ManifestOptions {
    pub kind: ManifestKind,
    /// Relative paths are joined with the client's working directory
    pub file: PathBuf,
    pub client: Arc<Client>,
}

#[derive(Debug)]
enum Stage {
    Opened,
    Loaded(String),
    Parsed(TaskManifest),
    Validated(TaskManifest),
}

/// Loads a manifest through ordered stages. A failing stage is latched and
/// the following stages are skipped; [`ManifestBuilder::build`] reports it.
#[derive(Debug)]
pub struct ManifestBuilder {
    kind: ManifestKind,
    file: PathBuf,
    client: Arc<Client>,
    state: Result<Stage>,
}

impl ManifestBuilder {
    pub fn new(opts: ManifestOptions) -> Result<Self> {
        if opts.file.as_os_str().is_empty() {
            return Err(StilettoError::argument(
                "The manifest file is required. Ensure it's passed as a relative path of the current directory",
            ));
        }

        let file = if opts.file.is_absolute() {
            opts.file
        } else {
            opts.client.dirs().base_dir_abs.join(&opts.file)
        };

        if !file.is_file() {
            let err = StilettoError::argument(format!("invalid manifest file: {}", file.display()));
            error!("{}", err);
            return Err(err);
        }

        Ok(Self { kind: opts.kind, file, client: opts.client, state: Ok(Stage::Opened) })
    }

    /// Path of the manifest being loaded.
    pub fn file(&self) -> &std::path::Path {
        &self.file
    }

    fn advance<F>(mut self, step: F) -> Self
    where
        F: FnOnce(&Self, Stage) -> Result<Stage>,
    {
        let state = std::mem::replace(&mut self.state, Ok(Stage::Opened));
        self.state = state.and_then(|stage| {
            let _guard = self.client.span().enter();
            step(&self, stage).map_err(|e| {
                error!(manifest = %self.file.display(), "{}", e);
                e
            })
        });
        self
    }

    /// Read the manifest into memory.
    pub fn with_content(self) -> Self {
        self.advance(|b, _| {
            let content = fs::read_to_string(&b.file).map_err(|e| {
                StilettoError::argument_with(
                    format!("Cannot extract manifest content from {}", b.file.display()),
                    e,
                )
            })?;

            if content.trim().is_empty() {
                return Err(StilettoError::argument(format!(
                    "Cannot extract manifest content. The manifest file {} is empty",
                    b.file.display()
                )));
            }

            Ok(Stage::Loaded(content))
        })
    }

    /// Run the template functions over the loaded content.
    pub fn with_compiled_templates(self) -> Self {
        self.advance(|b, stage| match stage {
            Stage::Loaded(content) => {
                let dirs = b.client.dirs();
                let ctx = TemplateContext {
                    host_env: b.client.host_env(),
                    pwd: &dirs.base_dir_abs,
                    home: &dirs.home_dir_abs,
                };
                let rendered = render_templates(&content, &ctx)?;
                info!(manifest = %b.file.display(), "manifest template functions compiled");
                Ok(Stage::Loaded(rendered))
            }
            _ => Err(StilettoError::argument(
                "Cannot compile manifest template functions. The manifest content must be loaded first",
            )),
        })
    }

    /// Deserialize the content into a [`TaskManifest`].
    pub fn with_constructed_spec(self) -> Self {
        self.advance(|b, stage| match stage {
            Stage::Loaded(content) => {
                let manifest: TaskManifest = serde_yaml::from_str(&content).map_err(|e| {
                    StilettoError::argument(format!(
                        "Cannot construct manifest spec. Cannot parse yaml file {}: {}",
                        b.file.display(),
                        e
                    ))
                })?;
                Ok(Stage::Parsed(manifest))
            }
            _ => Err(StilettoError::argument(
                "Cannot construct manifest spec. The manifest content must be loaded first",
            )),
        })
    }

    /// Semantic checks. Fills an empty `baseDir` with the working directory.
    pub fn with_strict_deep_validation(self) -> Self {
        self.advance(|b, stage| match stage {
            Stage::Parsed(manifest) | Stage::Validated(manifest) => {
                b.validate(manifest).map(Stage::Validated)
            }
            _ => Err(StilettoError::manifest(
                "task manifest is required prior to its validation. Ensure the spec was constructed first",
            )),
        })
    }

    fn validate(&self, mut manifest: TaskManifest) -> Result<TaskManifest> {
        manifest.kind.parse::<ManifestKind>()?;

        if manifest.api_version != API_VERSION {
            return Err(StilettoError::manifest(format!(
                "invalid manifest api version: {}. Should be '{}'",
                manifest.api_version, API_VERSION
            )));
        }

        if manifest.metadata.name.is_empty() {
            return Err(StilettoError::manifest(
                "manifest name is required. Give it a proper name. E.g.: 'my-task'",
            ));
        }

        let spec = &mut manifest.spec;
        if spec.container_image.is_empty() {
            return Err(StilettoError::manifest(
                "container image is required. It's required to bootstrap the task container",
            ));
        }

        if spec.base_dir.is_empty() {
            info!("the 'baseDir' in the task manifest isn't set, resolving it to the current directory");
            spec.base_dir = self.client.dirs().base_dir_abs.to_string_lossy().to_string();
        }

        if spec.workdir.is_empty() {
            return Err(StilettoError::manifest("workDir is required"));
        }

        if spec.mount_dir.is_empty() {
            return Err(StilettoError::manifest("mountDir is required"));
        }

        validate_containment(&spec.base_dir, &spec.workdir, &spec.mount_dir).map_err(|e| {
            StilettoError::manifest_with("The manifest directory configuration is invalid", e)
        })?;

        if spec.commands_spec.is_empty() {
            return Err(StilettoError::manifest(
                "The manifest commands are invalid. They should have at least one command",
            ));
        }

        if spec.commands_spec.iter().any(|c| c.commands.is_empty()) {
            return Err(StilettoError::manifest(
                "The manifest commands are invalid. It was detected a configuration, but without any command to execute",
            ));
        }

        Ok(manifest)
    }

    /// The loaded manifest, or the first error wrapped as a configuration error.
    pub fn build(self) -> Result<TaskManifest> {
        let kind = self.kind;
        let stage = self.state.map_err(|e| {
            StilettoError::configuration_with(format!("cannot build manifest of type '{}'", kind), e)
        })?;

        match stage {
            Stage::Parsed(manifest) | Stage::Validated(manifest) => Ok(manifest),
            _ => Err(StilettoError::configuration(format!(
                "cannot build manifest of type '{}': the manifest spec was never constructed",
                kind
            ))),
        }
    }
}

/// Load, render, parse and validate a Task manifest.
pub fn load_task_manifest(client: &Arc<Client>, file: impl Into<PathBuf>) -> Result<TaskManifest> {
    ManifestBuilder::new(ManifestOptions {
        kind: ManifestKind::Task,
        file: file.into(),
        client: Arc::clone(client),
    })?
    .with_content()
    .with_compiled_templates()
    .with_constructed_spec()
    .with_strict_deep_validation()
    .build()
}
