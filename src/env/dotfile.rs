//! `KEY=VALUE` dotfile reader

use std::fs;
use std::path::Path;

use super::{strip_double_quotes, EnvVars};
use crate::error::{Result, StilettoError};

/// Parse dotfile content. Blank lines are skipped; any other line must
/// contain `=` with a non-empty key. `#` is not a comment marker.
pub fn parse_dotfile(content: &str, origin: &str) -> Result<EnvVars> {
    let mut vars = EnvVars::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| {
            StilettoError::argument(format!(
                "dotfile {} is not in the correct format (line {}: expected KEY=VALUE)",
                origin,
                index + 1
            ))
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(StilettoError::argument(format!(
                "dotfile {} has an empty key on line {}",
                origin,
                index + 1
            )));
        }

        vars.insert(key.to_string(), strip_double_quotes(value.trim()).to_string());
    }

    Ok(vars)
}

/// Read and parse a dotfile. A missing file is an argument error and a file
/// that declares nothing is a configuration error.
pub fn read_dotfile(path: &Path) -> Result<EnvVars> {
    if path.as_os_str().is_empty() {
        return Err(StilettoError::argument("No dotfile path provided"));
    }

    if !path.is_file() {
        return Err(StilettoError::argument(format!(
            "The dotfile path {} is not valid",
            path.display()
        )));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        StilettoError::argument_with(format!("Could not read dotfile {}", path.display()), e)
    })?;

    let vars = parse_dotfile(&content, &path.display().to_string())?;
    if vars.is_empty() {
        return Err(StilettoError::configuration(format!(
            "No environment variables found in dotfile {}",
            path.display()
        )));
    }

    Ok(vars)
}
