//! Host environment scans

use tracing::debug;

use super::{EnvVarBehaviourOptions, EnvVars};
use crate::error::{Result, StilettoError};

/// Snapshot the process environment. Variables whose name or value is not
/// valid UTF-8 are skipped.
pub fn host_env_snapshot() -> EnvVars {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

fn not_set(key: &str) -> StilettoError {
    StilettoError::configuration(format!(
        "The environment variable {} is not set, but was declared mandatory",
        key
    ))
}

/// Keep only host variables whose name starts with `prefix`. Empty values are
/// part of the scan so the required check can see them; `remove_env_vars_if_found`
/// is applied after every check has passed.
pub fn fetch_with_prefix(
    host: &EnvVars,
    prefix: &str,
    opts: &EnvVarBehaviourOptions,
) -> Result<EnvVars> {
    let mut found: EnvVars = host
        .iter()
        .filter(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    debug!(prefix, count = found.len(), "scanned host environment");

    if found.is_empty() && opts.fail_if_not_set {
        return Err(StilettoError::configuration(format!(
            "No environment variables with the prefix {} found",
            prefix
        )));
    }

    for key in &opts.required_env_vars {
        if opts.ignore_if_not_set_or_empty.contains(key) {
            continue;
        }
        match found.get(key) {
            None => return Err(not_set(key)),
            Some(value) if value.is_empty() && opts.fail_if_not_set => {
                return Err(StilettoError::configuration(format!(
                    "The environment variable {} is set, but its value is empty",
                    key
                )))
            }
            Some(_) => {}
        }
    }

    for key in &opts.remove_env_vars_if_found {
        found.remove(key);
    }

    Ok(found)
}

/// The whole host environment, with a presence check for required keys.
pub fn fetch_host(host: &EnvVars, opts: &EnvVarBehaviourOptions) -> Result<EnvVars> {
    if host.is_empty() && opts.fail_if_not_set {
        return Err(StilettoError::configuration("No environment variables found on the host"));
    }

    for key in &opts.required_env_vars {
        if opts.ignore_if_not_set_or_empty.contains(key) {
            continue;
        }
        if !host.contains_key(key) {
            return Err(not_set(key));
        }
    }

    let mut found = host.clone();
    for key in &opts.remove_env_vars_if_found {
        found.remove(key);
    }

    Ok(found)
}

/// Pick specific keys from the host. Missing keys fail when `fail_if_not_set`
/// and are skipped otherwise.
pub fn fetch_custom_keys(host: &EnvVars, keys: &[String], fail_if_not_set: bool) -> Result<EnvVars> {
    if keys.is_empty() {
        return Err(StilettoError::argument("No environment variable keys provided"));
    }

    let mut found = EnvVars::new();
    for key in keys {
        match host.get(key) {
            Some(value) => {
                found.insert(key.clone(), value.clone());
            }
            None if fail_if_not_set => return Err(not_set(key)),
            None => debug!(key = key.as_str(), "custom environment variable not set, skipping"),
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn host() -> EnvVars {
        [
            ("AWS_REGION", "eu-west-1"),
            ("AWS_SECRET", "s3cr3t"),
            ("AWS_EMPTY", ""),
            ("TF_VAR_x", "1"),
            ("HOME", "/home/me"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefix_scan_keeps_prefixed_keys() {
        let found = fetch_with_prefix(&host(), "AWS_", &EnvVarBehaviourOptions::enabled()).unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.contains_key("AWS_EMPTY"));
        assert!(!found.contains_key("HOME"));
    }

    #[test]
    fn test_prefix_scan_empty_fails_when_required() {
        let opts = EnvVarBehaviourOptions { fail_if_not_set: true, ..EnvVarBehaviourOptions::enabled() };
        let err = fetch_with_prefix(&host(), "GCP_", &opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let found = fetch_with_prefix(&host(), "GCP_", &EnvVarBehaviourOptions::enabled()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_required_missing_names_key() {
        let mut h = host();
        h.remove("AWS_REGION");
        let opts = EnvVarBehaviourOptions {
            required_env_vars: strings(&["AWS_REGION"]),
            ..EnvVarBehaviourOptions::enabled()
        };
        let err = fetch_with_prefix(&h, "AWS_", &opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("AWS_REGION"));
    }

    #[test]
    fn test_required_empty_only_fails_with_fail_if_not_set() {
        let mut opts = EnvVarBehaviourOptions {
            required_env_vars: strings(&["AWS_EMPTY"]),
            ..EnvVarBehaviourOptions::enabled()
        };
        assert!(fetch_with_prefix(&host(), "AWS_", &opts).is_ok());

        opts.fail_if_not_set = true;
        let err = fetch_with_prefix(&host(), "AWS_", &opts).unwrap_err();
        assert!(err.to_string().contains("AWS_EMPTY"));

        opts.ignore_if_not_set_or_empty = strings(&["AWS_EMPTY"]);
        assert!(fetch_with_prefix(&host(), "AWS_", &opts).is_ok());
    }

    #[test]
    fn test_remove_runs_after_required_check() {
        let opts = EnvVarBehaviourOptions {
            required_env_vars: strings(&["AWS_SECRET"]),
            remove_env_vars_if_found: strings(&["AWS_SECRET"]),
            ..EnvVarBehaviourOptions::enabled()
        };
        let found = fetch_with_prefix(&host(), "AWS_", &opts).unwrap();
        assert!(!found.contains_key("AWS_SECRET"));
        assert_eq!(found.get("AWS_REGION").map(String::as_str), Some("eu-west-1"));
    }

    #[test]
    fn test_host_scan() {
        let opts = EnvVarBehaviourOptions {
            required_env_vars: strings(&["HOME"]),
            ..EnvVarBehaviourOptions::enabled()
        };
        assert_eq!(fetch_host(&host(), &opts).unwrap().len(), 5);

        let opts = EnvVarBehaviourOptions {
            required_env_vars: strings(&["MISSING"]),
            ..EnvVarBehaviourOptions::enabled()
        };
        assert!(fetch_host(&host(), &opts).is_err());

        let opts = EnvVarBehaviourOptions { fail_if_not_set: true, ..EnvVarBehaviourOptions::enabled() };
        assert!(fetch_host(&EnvVars::new(), &opts).is_err());
    }

    #[test]
    fn test_custom_keys() {
        let found = fetch_custom_keys(&host(), &strings(&["HOME", "NOPE"]), false).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["HOME"], "/home/me");

        let err = fetch_custom_keys(&host(), &strings(&["NOPE"]), true).unwrap_err();
        assert!(err.to_string().contains("NOPE"));

        assert!(fetch_custom_keys(&host(), &[], false).is_err());
    }

    #[test]
    fn test_host_snapshot_keys_non_empty() {
        let snapshot = host_env_snapshot();
        assert!(snapshot.keys().all(|k| !k.is_empty()));
    }
}
