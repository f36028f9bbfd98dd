use crate::{ConfigError, LogLevel, MshConfig};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".config/msh/msh.yaml"));
        }
        search_paths.push(PathBuf::from("./msh.yaml"));

        #[cfg(unix)]
        search_paths.insert(0, PathBuf::from("/etc/msh/msh.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn load(&self) -> Result<MshConfig, ConfigError> {
        self.load_with(|name| std::env::var(name).ok())
    }

    /// Loads configuration reading environment variables through `env`.
    ///
    /// Search-path files are merged in order, then `MSH_CONFIG`, then the
    /// explicit file; later layers override individual keys of earlier ones.
    /// Missing search-path files are skipped, a missing explicit file is an
    /// error.
    pub fn load_with<E>(&self, env: E) -> Result<MshConfig, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut merged = Value::Mapping(Mapping::new());

        for path in &self.search_paths {
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    debug!(path = %path.display(), "loading config layer");
                    merge_values(&mut merged, parse_layer(&content, &env)?);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable config"),
            }
        }

        let env_file = env("MSH_CONFIG")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        for path in env_file.iter().chain(self.explicit_file.iter()) {
            let content = read_file(path)?;
            debug!(path = %path.display(), "loading config file");
            merge_values(&mut merged, parse_layer(&content, &env)?);
        }

        let mut config: MshConfig = serde_yaml::from_value(merged)?;
        apply_env_overrides(&mut config, &env);
        config.validate()?;
        Ok(config)
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_layer<E>(content: &str, env: &E) -> Result<Value, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let expanded = expand_env_vars(content, env)?;
    Ok(serde_yaml::from_str(&expanded)?)
}

/// Replaces `${NAME}` with the variable's value; unset variables expand to
/// the empty string.
fn expand_env_vars<E>(content: &str, env: &E) -> Result<String, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([^}]+)\}")?;
    Ok(re
        .replace_all(content, |caps: &regex::Captures| {
            env(&caps[1]).unwrap_or_default()
        })
        .into_owned())
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides<E>(config: &mut MshConfig, env: &E)
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(root) = env("MSH_ROOT").filter(|r| !r.is_empty()) {
        config.shell.root = Some(root);
    }
    if let Some(prompt) = env("MSH_PROMPT") {
        config.shell.prompt = prompt;
    }
    if let Some(level) = env("MSH_LOG_LEVEL") {
        match level.parse::<LogLevel>() {
            Ok(level) => config.logging.level = level,
            Err(e) => warn!(error = %e, "ignoring MSH_LOG_LEVEL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn expand_env_vars_works() {
        let env = env_of(&[("MSH_TEST_VAR", "hello")]);
        let result = expand_env_vars("value: ${MSH_TEST_VAR}", &env).unwrap();
        assert_eq!(result, "value: hello");
    }

    #[test]
    fn missing_env_var_becomes_empty() {
        let result = expand_env_vars("value: ${NONEXISTENT_VAR_XYZ}", &env_of(&[])).unwrap();
        assert_eq!(result, "value: ");
    }

    #[test]
    fn env_overrides_config() {
        let mut config = MshConfig::default();
        let env = env_of(&[
            ("MSH_ROOT", "/srv/flash"),
            ("MSH_PROMPT", "dev> "),
            ("MSH_LOG_LEVEL", "DEBUG"),
        ]);
        apply_env_overrides(&mut config, &env);
        assert_eq!(config.shell.root.as_deref(), Some("/srv/flash"));
        assert_eq!(config.shell.prompt, "dev> ");
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn invalid_log_level_override_is_ignored() {
        let mut config = MshConfig::default();
        apply_env_overrides(&mut config, &env_of(&[("MSH_LOG_LEVEL", "loud")]));
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn later_layers_override_individual_keys() {
        let dir = TempDir::new().unwrap();
        let system = write(
            &dir,
            "system.yaml",
            "shell:\n  prompt: \"sys> \"\n  max_script_depth: 3\n",
        );
        let user = write(&dir, "user.yaml", "shell:\n  prompt: \"user> \"\n");

        let config = ConfigLoader::new()
            .with_search_paths(vec![system, dir.path().join("absent.yaml"), user])
            .load_with(env_of(&[]))
            .unwrap();

        assert_eq!(config.shell.prompt, "user> ");
        assert_eq!(config.shell.max_script_depth, 3);
        assert_eq!(config.editor.save_sentinel, "---SAVE---");
    }

    #[test]
    fn explicit_file_wins_over_msh_config() {
        let dir = TempDir::new().unwrap();
        let from_env = write(&dir, "env.yaml", "editor:\n  show_buffer: false\n  save_sentinel: \":w\"\n");
        let explicit = write(&dir, "explicit.yaml", "editor:\n  save_sentinel: \":wq\"\n");
        let env_path = from_env.display().to_string();

        let config = ConfigLoader::new()
            .with_search_paths(Vec::new())
            .with_file(explicit)
            .load_with(env_of(&[("MSH_CONFIG", env_path.as_str())]))
            .unwrap();

        assert!(!config.editor.show_buffer);
        assert_eq!(config.editor.save_sentinel, ":wq");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigLoader::new()
            .with_search_paths(Vec::new())
            .with_file(dir.path().join("nope.yaml"))
            .load_with(env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn yaml_values_see_environment() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "msh.yaml", "shell:\n  root: \"${FLASH_DIR}/root\"\n");

        let config = ConfigLoader::new()
            .with_search_paths(vec![path])
            .load_with(env_of(&[("FLASH_DIR", "/mnt/device")]))
            .unwrap();

        assert_eq!(config.shell.root.as_deref(), Some("/mnt/device/root"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "msh.yaml", "shell:\n  max_script_depth: 0\n");

        let err = ConfigLoader::new()
            .with_search_paths(vec![path])
            .load_with(env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
