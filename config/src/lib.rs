//! msh Configuration System
//!
//! YAML configuration for the msh interpreter.
//!
//! # Configuration Loading Priority
//!
//! 1. Compiled-in defaults
//! 2. `/etc/msh/msh.yaml` (system-wide)
//! 3. `~/.config/msh/msh.yaml` (user)
//! 4. `./msh.yaml` (project-local)
//! 5. `MSH_CONFIG=/path/to/config.yaml`, then an explicit `--config` file
//! 6. Environment variables `MSH_ROOT`, `MSH_PROMPT`, `MSH_LOG_LEVEL`
//!
//! # Example Configuration
//!
//! ```yaml
//! shell:
//!   root: "~/device-flash"
//!   prompt: "msh:{cwd}$ "
//!   max_script_depth: 8
//!   history:
//!     enabled: true
//!     file: "~/.msh_history"
//!
//! editor:
//!   save_sentinel: "---SAVE---"
//!   abort_sentinel: "---END---"
//!
//! logging:
//!   level: warn
//!   format: compact
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::*;

/// Load configuration from default locations.
///
/// Searches for config files in order and merges them.
/// Environment variables override file values.
pub fn load() -> Result<MshConfig, ConfigError> {
    ConfigLoader::new().load()
}

/// Load configuration from default locations plus a specific file.
pub fn load_from_file(path: &str) -> Result<MshConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MshConfig::default();
        config.validate().unwrap();
        assert_eq!(config.shell.prompt, "msh:{cwd}$ ");
        assert_eq!(config.shell.max_script_depth, 8);
        assert_eq!(config.editor.save_sentinel, "---SAVE---");
        assert_eq!(config.editor.abort_sentinel, "---END---");
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = r#"
shell:
  prompt: "> "
"#;
        let config: MshConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.shell.prompt, "> ");
        assert_eq!(config.shell.max_script_depth, 8); // default
        assert!(config.shell.root.is_none());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
shell:
  root: "/tmp/flash"
  prompt: "dev:{cwd}# "
  banner: ""
  max_script_depth: 2
  history:
    enabled: false
    file: "/tmp/hist"
    max_entries: 50

editor:
  save_sentinel: ":w"
  abort_sentinel: ":q"
  show_buffer: false

logging:
  level: debug
  format: compact
  filter: "msh=trace"
"#;
        let config: MshConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.shell.root.as_deref(), Some("/tmp/flash"));
        assert_eq!(config.shell.render_prompt("/data"), "dev:/data# ");
        assert!(!config.shell.history.enabled);
        assert_eq!(config.shell.history.max_entries, 50);
        assert_eq!(config.editor.abort_sentinel, ":q");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.filter, "msh=trace");
    }

    #[test]
    fn identical_sentinels_are_invalid() {
        let mut config = MshConfig::default();
        config.editor.abort_sentinel = config.editor.save_sentinel.clone();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn plain_root_path_is_kept() {
        let mut config = MshConfig::default();
        config.shell.root = Some("/plain/path".to_string());
        assert_eq!(
            config.shell.root_path().unwrap(),
            std::path::PathBuf::from("/plain/path")
        );
    }
}
