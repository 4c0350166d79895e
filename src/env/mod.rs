//! Environment variable resolution
//!
//! Tasks and Jobs receive their environment from several sources: provider
//! prefix scans over the host environment, the full host environment, picked
//! host keys, the manifest's literal mapping and dotfiles. Each source yields
//! an [`EnvVars`] map and the maps are merged in a fixed order.

pub mod dotfile;
pub mod fetch;
pub mod options;

use std::collections::BTreeMap;

pub use dotfile::{parse_dotfile, read_dotfile};
pub use fetch::{fetch_custom_keys, fetch_host, fetch_with_prefix, host_env_snapshot};
pub use options::{EnvResolver, EnvVarBehaviourOptions, EnvVarsOptions};

/// Ordered environment mapping, so containers receive variables in a stable order.
pub type EnvVars = BTreeMap<String, String>;

/// Prefix of the AWS provider scan.
pub const AWS_PREFIX: &str = "AWS_";

/// Prefix of the Terraform provider scan.
pub const TERRAFORM_PREFIX: &str = "TF_";

/// Merge maps left to right. The right-hand map wins on collisions and pairs
/// with an empty key or an empty value are never written, so an earlier
/// non-empty value survives a later empty one.
pub fn merge_env_vars<'a, I>(maps: I) -> EnvVars
where
    I: IntoIterator<Item = &'a EnvVars>,
{
    let mut result = EnvVars::new();

    for map in maps {
        for (key, value) in map {
            let value = strip_double_quotes(value);
            if key.is_empty() || value.is_empty() {
                continue;
            }
            result.insert(key.clone(), value.to_string());
        }
    }

    result
}

/// Remove one pair of surrounding double quotes, if present.
pub fn strip_double_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
