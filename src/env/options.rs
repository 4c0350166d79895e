//! Source options and the resolver that evaluates them

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{
    fetch_custom_keys, fetch_host, fetch_with_prefix, merge_env_vars, read_dotfile, EnvVars,
    AWS_PREFIX, TERRAFORM_PREFIX,
};
use crate::error::Result;

/// Options of a host scan source (prefix scans and the full host scan).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVarBehaviourOptions {
    pub enabled: bool,
    pub fail_if_not_set: bool,
    pub required_env_vars: Vec<String>,
    pub ignore_if_not_set_or_empty: Vec<String>,
    pub remove_env_vars_if_found: Vec<String>,
}

impl EnvVarBehaviourOptions {
    /// An enabled source with every check switched off.
    pub fn enabled() -> Self {
        Self { enabled: true, ..Self::default() }
    }
}

/// Which sources feed a Task or Job environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVarsOptions {
    /// Copy the owning Job's environment and skip every other source.
    pub inherit_from_job: bool,
    pub aws: EnvVarBehaviourOptions,
    pub terraform: EnvVarBehaviourOptions,
    pub host: EnvVarBehaviourOptions,
    /// Host keys to pick one by one.
    pub custom_keys: Vec<String>,
    pub fail_if_custom_not_set: bool,
    pub explicit: EnvVars,
    pub dotfiles: Vec<String>,
}

impl EnvVarsOptions {
    /// True when no source is enabled.
    pub fn is_empty(&self) -> bool {
        !self.aws.enabled
            && !self.terraform.enabled
            && !self.host.enabled
            && self.custom_keys.is_empty()
            && self.explicit.is_empty()
            && self.dotfiles.is_empty()
    }
}

/// Evaluates [`EnvVarsOptions`] against a host snapshot. Relative dotfile
/// paths are resolved against `base_dir`.
#[derive(Debug, Clone, Copy)]
pub struct EnvResolver<'a> {
    host: &'a EnvVars,
    base_dir: &'a Path,
}

impl<'a> EnvResolver<'a> {
    pub fn new(host: &'a EnvVars, base_dir: &'a Path) -> Self {
        Self { host, base_dir }
    }

    /// Evaluate every enabled source in order and merge the results. The
    /// first failing source aborts the resolution.
    pub fn resolve(&self, opts: &EnvVarsOptions) -> Result<EnvVars> {
        let mut resolved = EnvVars::new();

        if opts.aws.enabled {
            let found = fetch_with_prefix(self.host, AWS_PREFIX, &opts.aws)?;
            resolved = merge_env_vars([&resolved, &found]);
        }

        if opts.terraform.enabled {
            let found = fetch_with_prefix(self.host, TERRAFORM_PREFIX, &opts.terraform)?;
            resolved = merge_env_vars([&resolved, &found]);
        }

        if opts.host.enabled {
            let found = fetch_host(self.host, &opts.host)?;
            resolved = merge_env_vars([&resolved, &found]);
        }

        if !opts.custom_keys.is_empty() {
            let found = fetch_custom_keys(self.host, &opts.custom_keys, opts.fail_if_custom_not_set)?;
            resolved = merge_env_vars([&resolved, &found]);
        }

        if !opts.explicit.is_empty() {
            resolved = merge_env_vars([&resolved, &opts.explicit]);
        }

        if !opts.dotfiles.is_empty() {
            let mut from_files = EnvVars::new();
            for file in &opts.dotfiles {
                let found = read_dotfile(&self.dotfile_path(file))?;
                from_files = merge_env_vars([&from_files, &found]);
            }
            resolved = merge_env_vars([&resolved, &from_files]);
        }

        debug!(count = resolved.len(), "resolved environment");
        Ok(resolved)
    }

    fn dotfile_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> EnvVars {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_no_sources_is_empty() {
        let host = vars(&[("AWS_REGION", "x")]);
        let temp = TempDir::new().unwrap();
        let resolver = EnvResolver::new(&host, temp.path());
        assert!(EnvVarsOptions::default().is_empty());
        assert!(resolver.resolve(&EnvVarsOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_sources_override_in_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.env"), "SHARED=dotfile-a\nONLY_A=a\n").unwrap();
        std::fs::write(temp.path().join("b.env"), "SHARED=dotfile-b\n").unwrap();

        let host = vars(&[("AWS_REGION", "eu-west-1"), ("SHARED", "host"), ("TF_LOG", "")]);
        let resolver = EnvResolver::new(&host, temp.path());

        let opts = EnvVarsOptions {
            aws: EnvVarBehaviourOptions::enabled(),
            terraform: EnvVarBehaviourOptions::enabled(),
            custom_keys: vec!["SHARED".to_string()],
            explicit: vars(&[("SHARED", "explicit"), ("EXPLICIT", "1")]),
            dotfiles: vec!["a.env".to_string(), "b.env".to_string()],
            ..EnvVarsOptions::default()
        };

        let resolved = resolver.resolve(&opts).unwrap();
        assert_eq!(resolved["SHARED"], "dotfile-b");
        assert_eq!(resolved["ONLY_A"], "a");
        assert_eq!(resolved["EXPLICIT"], "1");
        assert_eq!(resolved["AWS_REGION"], "eu-west-1");
        assert!(!resolved.contains_key("TF_LOG"));
    }

    #[test]
    fn test_required_aws_region_absent() {
        let host = vars(&[("AWS_PROFILE", "dev")]);
        let temp = TempDir::new().unwrap();
        let opts = EnvVarsOptions {
            aws: EnvVarBehaviourOptions {
                required_env_vars: vec!["AWS_REGION".to_string()],
                ..EnvVarBehaviourOptions::enabled()
            },
            explicit: vars(&[("X", "1")]),
            ..EnvVarsOptions::default()
        };
        let err = EnvResolver::new(&host, temp.path()).resolve(&opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("AWS_REGION"));
    }

    #[test]
    fn test_removed_key_checked_before_removal() {
        let host = vars(&[("AWS_REGION", "eu-west-1"), ("AWS_SECRET", "s")]);
        let temp = TempDir::new().unwrap();
        let opts = EnvVarsOptions {
            aws: EnvVarBehaviourOptions {
                required_env_vars: vec!["AWS_SECRET".to_string()],
                remove_env_vars_if_found: vec!["AWS_SECRET".to_string()],
                ..EnvVarBehaviourOptions::enabled()
            },
            ..EnvVarsOptions::default()
        };
        let resolved = EnvResolver::new(&host, temp.path()).resolve(&opts).unwrap();
        assert!(!resolved.contains_key("AWS_SECRET"));
        assert!(resolved.contains_key("AWS_REGION"));
    }

    #[test]
    fn test_missing_dotfile_aborts() {
        let host = EnvVars::new();
        let temp = TempDir::new().unwrap();
        let opts = EnvVarsOptions {
            explicit: vars(&[("X", "1")]),
            dotfiles: vec!["missing.env".to_string()],
            ..EnvVarsOptions::default()
        };
        let err = EnvResolver::new(&host, temp.path()).resolve(&opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }
}
