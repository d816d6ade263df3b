use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "timetable.json";

/// Default log file name inside the data directory
pub const LOG_FILE: &str = "timetable.log";

/// Overrides for the default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (TIMETABLE_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| {
            std::env::var("TIMETABLE_CONFIG_DIR")
                .ok()
                .map(PathBuf::from)
        });

        Self { config_dir }
    }
}

/// Path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. TIMETABLE_CONFIG_DIR environment variable
/// 3. Current directory IF it already holds timetable.json
/// 4. Platform config directory from dirs-next (e.g. ~/.config/timetable)
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    config_dir_in(config, std::env::current_dir().ok().as_deref()).join(name)
}

/// Path to a data file (logs)
///
/// Same priority as `config_file`, falling back to the platform data dir.
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.join(name);
    }
    if let Ok(cwd) = std::env::current_dir() {
        if cwd.join(SETTINGS_FILE).exists() {
            return cwd.join(name);
        }
    }
    dirs_next::data_dir()
        .map(|d| d.join("timetable"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
}

/// Create the directory holding `file` if it is missing
pub fn ensure_parent(file: &Path) -> Result<()> {
    if let Some(dir) = file.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    Ok(())
}

fn config_dir_in(config: &PathConfig, cwd: Option<&Path>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Some(cwd) = cwd {
        if cwd.join(SETTINGS_FILE).exists() {
            return cwd.to_path_buf();
        }
    }

    if let Some(dir) = dirs_next::config_dir() {
        return dir.join("timetable");
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("test.json", &config), PathBuf::from("/custom/test.json"));
        assert_eq!(data_file("run.log", &config), PathBuf::from("/custom/run.log"));
    }

    #[test]
    fn test_local_settings_take_priority() {
        let dir = tempfile::tempdir().unwrap();
        let config = PathConfig::default();

        let without = config_dir_in(&config, Some(dir.path()));
        assert_ne!(without, dir.path());

        std::fs::write(dir.path().join(SETTINGS_FILE), "{}").unwrap();
        let with = config_dir_in(&config, Some(dir.path()));
        assert_eq!(with, dir.path());
    }

    #[test]
    fn test_ensure_parent_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a/b/timetable.log");
        ensure_parent(&file).unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }
}
