//! Path token resolution against the working directory.
//!
//! Resolution is purely lexical and never touches the filesystem; callers
//! validate existence themselves.

use crate::vars::VariableStore;

/// Prefix marking a variable reference.
pub const VAR_PREFIX: char = '$';

/// Length in bytes of the variable name at the start of `s`: the maximal
/// run of ASCII alphanumerics and underscores.
#[must_use]
pub fn var_name_len(s: &str) -> usize {
    s.bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count()
}

/// Turns a user-supplied path token into an absolute path.
///
/// A leading `$NAME` is replaced by the variable's value when bound and kept
/// literally otherwise. Absolute paths only have repeated separators
/// collapsed. Relative paths are folded onto `cwd` segment by segment: `..`
/// pops (stopping at the root), `.` and empty segments are dropped.
#[must_use]
pub fn resolve(token: &str, cwd: &str, vars: &VariableStore) -> String {
    let token = substitute_prefix(token, cwd, vars);

    if token.starts_with('/') {
        return collapse_separators(&token);
    }

    match token.as_str() {
        "." | "./" => return cwd.to_string(),
        ".." => return parent(cwd),
        _ => {}
    }

    let mut segments: Vec<&str> = cwd.split('/').filter(|s| !s.is_empty()).collect();
    for segment in token.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    build(&segments)
}

/// Parent of an absolute path; the root is its own parent.
#[must_use]
pub fn parent(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.split_last() {
        Some((_, rest)) => build(rest),
        None => "/".to_string(),
    }
}

fn substitute_prefix(token: &str, cwd: &str, vars: &VariableStore) -> String {
    if let Some(rest) = token.strip_prefix(VAR_PREFIX) {
        let len = var_name_len(rest);
        if len > 0 {
            if let Some(value) = vars.lookup(&rest[..len], cwd) {
                return format!("{value}{}", &rest[len..]);
            }
        }
    }
    token.to_string()
}

fn collapse_separators(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    build(&segments)
}

fn build(segments: &[&str]) -> String {
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}
