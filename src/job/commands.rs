//! Command strings and their shell-word tokenizer

use serde::Serialize;

use crate::error::{Result, StilettoError};

/// One invocation run inside a task container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    /// Binary given in the manifest; empty when the command string names it
    binary: String,
    /// Command string as written in the manifest
    raw: String,
    /// Full argument vector, binary first when one was given
    argv: Vec<String>,
}

impl Command {
    /// Tokenize `raw` and prefix `binary` when it is non-empty.
    pub fn new(binary: &str, raw: &str) -> Result<Self> {
        let words = split_command_line(raw)
            .map_err(|e| StilettoError::argument_with(format!("could not parse the command '{}'", raw), e))?;

        let mut argv = Vec::with_capacity(words.len() + 1);
        if !binary.is_empty() {
            argv.push(binary.to_string());
        }
        argv.extend(words);

        Ok(Self { binary: binary.to_string(), raw: raw.to_string(), argv })
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Split a command line into words using POSIX shell rules: whitespace
/// separates words, single quotes are literal, double quotes honour `\"`,
/// `\\`, `\$` and `` \` ``, a backslash outside quotes escapes the next
/// character and `#` at the start of a word begins a comment.
pub fn split_command_line(line: &str) -> Result<Vec<String>> {
    let words = shlex::split(line).ok_or_else(|| {
        StilettoError::argument(format!("unbalanced quotes or trailing escape in '{}'", line))
    })?;

    if words.is_empty() {
        return Err(StilettoError::argument("empty command"));
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn split(line: &str) -> Vec<String> {
        split_command_line(line).unwrap()
    }

    #[test]
    fn test_plain_words() {
        assert_eq!(split("plan -out  plan.tfplan"), vec!["plan", "-out", "plan.tfplan"]);
    }

    #[test]
    fn test_quotes() {
        assert_eq!(split(r#"echo 'a b' "c d""#), vec!["echo", "a b", "c d"]);
        assert_eq!(split(r#"echo '$HOME \n'"#), vec!["echo", r"$HOME \n"]);
        assert_eq!(split(r#"echo "say \"hi\" \$x \n""#), vec!["echo", r#"say "hi" $x \n"#]);
        assert_eq!(split("echo ''"), vec!["echo", ""]);
        assert_eq!(split(r#"a"b"'c'"#), vec!["abc"]);
    }

    #[test]
    fn test_backslash_outside_quotes() {
        assert_eq!(split(r"echo a\ b"), vec!["echo", "a b"]);
    }

    #[test]
    fn test_comments() {
        assert_eq!(split("ls -la # list everything"), vec!["ls", "-la"]);
        assert_eq!(split("echo a#b"), vec!["echo", "a#b"]);
    }

    #[test]
    fn test_errors() {
        for line in ["echo 'open", "echo \"open", "echo \\", "", "   ", "# only a comment"] {
            let err = split_command_line(line).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Argument, "line {:?}", line);
        }
    }

    #[test]
    fn test_command_prefixes_binary() {
        let cmd = Command::new("terraform", "plan -out plan.tfplan").unwrap();
        assert_eq!(cmd.argv(), ["terraform", "plan", "-out", "plan.tfplan"]);
        assert_eq!(cmd.raw(), "plan -out plan.tfplan");
        assert_eq!(cmd.binary(), "terraform");

        let cmd = Command::new("", "ls -la").unwrap();
        assert_eq!(cmd.argv(), ["ls", "-la"]);
        assert_eq!(cmd.to_string(), "ls -la");
    }
}
