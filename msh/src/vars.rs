//! Variable and alias tables.

use std::collections::BTreeMap;

use crate::error::{MshError, MshResult};

/// Name of the variable that always reflects the working directory.
pub const PWD: &str = "PWD";

/// Name to value mapping with assignment normalization. Listing is sorted
/// by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    entries: BTreeMap<String, String>,
}

impl NameTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `name` after trimming both and stripping one
    /// layer of matching quotes from the value. Empty names or values are
    /// rejected and leave the table unchanged.
    pub fn set(&mut self, name: &str, value: &str) -> MshResult<()> {
        let (name, value) = normalize_assignment(name, value)?;
        self.entries.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Returns whether the name was present.
    pub fn unset(&mut self, name: &str) -> bool {
        self.entries.remove(name.trim()).is_some()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn list(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Command aliases. Only the leading word of a line is ever substituted.
pub type AliasTable = NameTable;

/// Session variables plus the derived, read-only `PWD`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    table: NameTable,
}

impl VariableStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: &str) -> MshResult<()> {
        if name.trim() == PWD {
            return Err(MshError::invalid("PWD is read-only"));
        }
        self.table.set(name, value)
    }

    pub fn unset(&mut self, name: &str) -> MshResult<bool> {
        if name.trim() == PWD {
            return Err(MshError::invalid("PWD is read-only"));
        }
        Ok(self.table.unset(name))
    }

    /// Stored value only; `PWD` is not stored.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.table.get(name)
    }

    /// Value as seen by expansion, with `PWD` derived from `cwd`.
    #[must_use]
    pub fn lookup<'a>(&'a self, name: &str, cwd: &'a str) -> Option<&'a str> {
        if name == PWD {
            return Some(cwd);
        }
        self.table.get(name)
    }

    /// Sorted listing including `PWD`.
    #[must_use]
    pub fn list(&self, cwd: &str) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .table
            .list()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        entries.push((PWD.to_string(), cwd.to_string()));
        entries.sort();
        entries
    }
}

/// Splits `name=value` at the first `=`.
#[must_use]
pub fn parse_assignment(arg: &str) -> Option<(&str, &str)> {
    arg.split_once('=')
}

fn normalize_assignment<'a>(name: &'a str, value: &'a str) -> MshResult<(&'a str, &'a str)> {
    let name = name.trim();
    let value = strip_matching_quotes(value.trim());
    if name.is_empty() || value.is_empty() {
        return Err(MshError::invalid("name and value must not be empty"));
    }
    Ok((name, value))
}

fn strip_matching_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
