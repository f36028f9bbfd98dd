use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MshConfig {
    pub shell: ShellConfig,
    pub editor: EditorConfig,
    pub logging: LoggingConfig,
}

impl MshConfig {
    /// Rejects values the interpreter cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shell.max_script_depth == 0 {
            return Err(ConfigError::InvalidValue(
                "shell.max_script_depth must be at least 1".to_string(),
            ));
        }
        if self.editor.save_sentinel.trim().is_empty()
            || self.editor.abort_sentinel.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue(
                "editor sentinels must not be empty".to_string(),
            ));
        }
        if self.editor.save_sentinel == self.editor.abort_sentinel {
            return Err(ConfigError::InvalidValue(
                "editor.save_sentinel and editor.abort_sentinel must differ".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Host directory used as the device root. `None` runs on a volatile
    /// in-memory filesystem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Prompt template, `{cwd}` is replaced by the working directory.
    pub prompt: String,
    pub banner: String,
    pub max_script_depth: usize,
    pub history: HistoryConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            root: None,
            prompt: "msh:{cwd}$ ".to_string(),
            banner: "msh - type 'help' for a list of commands.".to_string(),
            max_script_depth: 8,
            history: HistoryConfig::default(),
        }
    }
}

impl ShellConfig {
    #[must_use]
    pub fn render_prompt(&self, cwd: &str) -> String {
        self.prompt.replace("{cwd}", cwd)
    }

    /// Root directory with `~` expanded.
    #[must_use]
    pub fn root_path(&self) -> Option<PathBuf> {
        self.root
            .as_deref()
            .map(|root| PathBuf::from(shellexpand::tilde(root).into_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub file: String,
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: "~/.msh_history".to_string(),
            max_entries: 1000,
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.file).into_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub save_sentinel: String,
    pub abort_sentinel: String,
    /// Print the numbered buffer before every editor prompt.
    pub show_buffer: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_sentinel: "---SAVE---".to_string(),
            abort_sentinel: "---END---".to_string(),
            show_buffer: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Pretty,
            filter: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(ConfigError::InvalidValue(format!("unknown log level: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
}
