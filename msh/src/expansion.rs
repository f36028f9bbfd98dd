//! Variable and alias expansion of raw input lines.

use crate::lexer::Token;
use crate::path::{var_name_len, VAR_PREFIX};
use crate::vars::{AliasTable, VariableStore};

/// Replaces every `$NAME` in `line` with its value in a single left-to-right
/// pass. Substituted text is never rescanned; unbound references are kept
/// verbatim.
#[must_use]
pub fn expand_variables(line: &str, cwd: &str, vars: &VariableStore) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(pos) = rest.find(VAR_PREFIX) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + VAR_PREFIX.len_utf8()..];
        let len = var_name_len(after);
        match vars.lookup(&after[..len], cwd) {
            Some(value) if len > 0 => out.push_str(value),
            _ => {
                out.push(VAR_PREFIX);
                out.push_str(&after[..len]);
            }
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}

/// If the first word of `line` names an alias, returns the line with that
/// word replaced by the alias value and the remainder appended untouched.
/// The result is not expanded again.
#[must_use]
pub fn expand_alias(line: &str, tokens: &[Token], aliases: &AliasTable) -> Option<String> {
    let first = tokens.first()?;
    let value = aliases.get(&first.text)?;
    Some(format!("{value}{}", &line[first.end..]))
}
