// TOML config adapter - Loads the configuration file and environment overlay

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::AppConfig;
use crate::error::{TrimTrackError, TrimTrackResult};

/// Resolves and loads `config.toml`
pub struct TomlConfigAdapter {
    explicit_path: Option<PathBuf>,
}

impl TomlConfigAdapter {
    /// `explicit_path` comes from `--config` and must exist when given
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self { explicit_path }
    }

    /// `<config dir>/trimtrack/config.toml`, e.g. `~/.config/trimtrack/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trimtrack").join("config.toml"))
    }

    /// File that will be read, if any
    pub fn resolve_path(&self) -> TrimTrackResult<Option<PathBuf>> {
        match &self.explicit_path {
            Some(path) if path.is_file() => Ok(Some(path.clone())),
            Some(path) => Err(TrimTrackError::ConfigError {
                message: format!("Config file not found: {}", path.display()),
            }),
            None => Ok(Self::default_config_path().filter(|path| path.is_file())),
        }
    }

    pub fn read_file(path: &Path) -> TrimTrackResult<AppConfig> {
        let content = fs::read_to_string(path).map_err(|e| TrimTrackError::ConfigError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        AppConfig::from_toml_str(&content)
    }

    /// Defaults, then the file, then `TRIMTRACK_*` variables, plus the file that
    /// was read. Not validated: command-line overrides still have to land.
    pub fn load(&self) -> TrimTrackResult<(AppConfig, Option<PathBuf>)> {
        let path = self.resolve_path()?;
        let mut config = match &path {
            Some(path) => Self::read_file(path)?,
            None => AppConfig::default(),
        };
        config.apply_env()?;
        Ok((config, path))
    }

    /// Write a config file, creating its folder
    pub fn save(path: &Path, config: &AppConfig) -> TrimTrackResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, config.to_toml_string()?)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TrackerKind;

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tracker]\nkind = \"kcf\"\nredetect_interval = 45\n").unwrap();

        let config = TomlConfigAdapter::read_file(&path).unwrap();
        assert_eq!(config.tracker.kind, TrackerKind::Kcf);
        assert_eq!(config.tracker.redetect_interval, 45);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = TomlConfigAdapter::new(Some(dir.path().join("absent.toml")));
        assert!(matches!(
            adapter.resolve_path(),
            Err(TrimTrackError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.tracker.skip_frames = 3;

        TomlConfigAdapter::save(&path, &config).unwrap();
        assert_eq!(TomlConfigAdapter::read_file(&path).unwrap(), config);
    }

    #[test]
    fn test_out_of_range_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tracker]\nredetect_interval = 500\n").unwrap();

        let config = TomlConfigAdapter::read_file(&path).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_value_can_be_replaced_before_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tracker]\nredetect_interval = 500\n").unwrap();

        let (mut config, source) = TomlConfigAdapter::new(Some(path.clone())).load().unwrap();
        assert_eq!(source, Some(path));
        assert_eq!(config.tracker.redetect_interval, 500);

        config.tracker.redetect_interval = 30;
        assert!(config.validate().is_ok());
    }
}
