//! Template functions available inside manifests
//!
//! A manifest may call a small, fixed set of functions with
//! `{{ name "arg" ... }}`. Rules run in the order of [`RULES`], each one
//! against the output of the previous one, and only when its name appears
//! in the content. As in Go templates, `{{-` trims the whitespace before
//! an action and `-}}` the whitespace after it.

use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::env::EnvVars;
use crate::error::{Result, StilettoError};

/// Values template functions may read.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub host_env: &'a EnvVars,
    pub pwd: &'a Path,
    pub home: &'a Path,
}

/// A named function with a fixed number of string arguments.
pub struct TemplateRule {
    pub name: &'static str,
    pub arity: usize,
    apply: fn(&TemplateContext<'_>, &[String]) -> String,
}

fn read_env(ctx: &TemplateContext<'_>, args: &[String]) -> String {
    ctx.host_env.get(&args[0]).cloned().unwrap_or_default()
}

fn get_pwd(ctx: &TemplateContext<'_>, _: &[String]) -> String {
    ctx.pwd.to_string_lossy().to_string()
}

fn get_home(ctx: &TemplateContext<'_>, _: &[String]) -> String {
    ctx.home.to_string_lossy().to_string()
}

fn replace(_: &TemplateContext<'_>, args: &[String]) -> String {
    args[0].replace(args[1].as_str(), &args[2])
}

fn trimspace(_: &TemplateContext<'_>, args: &[String]) -> String {
    args[0].trim().to_string()
}

pub const RULES: [TemplateRule; 5] = [
    TemplateRule { name: "readEnv", arity: 1, apply: read_env },
    TemplateRule { name: "getPwd", arity: 0, apply: get_pwd },
    TemplateRule { name: "getHome", arity: 0, apply: get_home },
    TemplateRule { name: "replace", arity: 3, apply: replace },
    TemplateRule { name: "trimspace", arity: 1, apply: trimspace },
];

/// Render every rule whose name appears in `content`.
pub fn render_templates(content: &str, ctx: &TemplateContext<'_>) -> Result<String> {
    let mut rendered = content.to_string();

    for rule in RULES.iter() {
        if !rendered.contains(rule.name) {
            continue;
        }
        rendered = render_rule(&rendered, rule, ctx)?;
        debug!(function = rule.name, "manifest template function compiled");
    }

    Ok(rendered)
}

fn render_rule(content: &str, rule: &TemplateRule, ctx: &TemplateContext<'_>) -> Result<String> {
    let name = regex::escape(rule.name);
    let action = compile(&format!(
        r#"\{{\{{(-)?\s*{}\b((?:"(?:[^"\\]|\\.)*"|[^}}"])*?)\s*(-)?\}}\}}"#,
        name
    ))?;

    let mut rendered = String::with_capacity(content.len());
    let mut last = 0;
    for caps in action.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };

        let before = &content[last..whole.start()];
        rendered.push_str(if caps.get(1).is_some() { before.trim_end() } else { before });
        rendered.push_str(&apply_rule(rule, ctx, caps.get(2).map_or("", |m| m.as_str()))?);

        last = whole.end();
        if caps.get(3).is_some() {
            let rest = &content[last..];
            last += rest.len() - rest.trim_start().len();
        }
    }
    rendered.push_str(&content[last..]);

    // An action left behind has a quote that never closes.
    let opening = compile(&format!(r"\{{\{{-?\s*{}\b", name))?;
    if let Some(m) = opening.find(&rendered) {
        let snippet: String = rendered[m.start()..].chars().take(40).collect();
        return Err(StilettoError::argument(format!(
            "cannot compile template function '{}': malformed action near '{}'",
            rule.name, snippet
        )));
    }

    Ok(rendered)
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| StilettoError::argument(format!("invalid template pattern '{}': {}", pattern, e)))
}

fn apply_rule(rule: &TemplateRule, ctx: &TemplateContext<'_>, raw: &str) -> Result<String> {
    let args = parse_arguments(raw).map_err(|e| {
        StilettoError::argument_with(format!("cannot compile template function '{}'", rule.name), e)
    })?;
    if args.len() != rule.arity {
        return Err(StilettoError::argument(format!(
            "template function '{}' expects {} argument(s), got {}",
            rule.name,
            rule.arity,
            args.len()
        )));
    }
    Ok((rule.apply)(ctx, &args))
}

/// Parse a whitespace separated list of double quoted strings.
fn parse_arguments(raw: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut chars = raw.trim().chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if c != '"' {
            return Err(StilettoError::argument(format!(
                "template arguments must be double quoted strings: {}",
                raw.trim()
            )));
        }

        let mut arg = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    closed = true;
                    break;
                }
                '\\' => match chars.next() {
                    Some('n') => arg.push('\n'),
                    Some('t') => arg.push('\t'),
                    Some(other) => arg.push(other),
                    None => break,
                },
                _ => arg.push(c),
            }
        }

        if !closed {
            return Err(StilettoError::argument(format!(
                "unterminated template argument: {}",
                raw.trim()
            )));
        }
        if matches!(chars.peek(), Some(next) if !next.is_whitespace()) {
            return Err(StilettoError::argument(format!(
                "template arguments must be separated by spaces: {}",
                raw.trim()
            )));
        }
        args.push(arg);
    }

    Ok(args)
}
