//! Configuration file loader with multi-source merging

use super::file_config::{ConfigValidationError, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "tool-onboard";
const PROJECT_FILES: [&str; 2] = ["onboard.toml", ".onboard.toml"];
const ENV_PREFIX: &str = "ONBOARD_";

/// One place configuration may come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: &'static str,
    pub location: String,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `ONBOARD_` environment variables (`ONBOARD_GATEWAY__ENDPOINT=...`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./onboard.toml` or `./.onboard.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/tool-onboard/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigValidationError> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(ConfigValidationError::MissingFile(path.to_path_buf()));
        }

        let figment = Self::file_layers(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
            config_path,
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Ok(figment.extract().map_err(Box::new)?)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Defaults plus whichever of the given files exist, in priority order.
    fn file_layers(global: Option<&Path>, project: Option<&Path>, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in [global, project, explicit].into_iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }
        figment
    }

    /// Get the global config file path
    ///
    /// Returns `$XDG_CONFIG_HOME/tool-onboard/config.toml` if set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// The config file locations being consulted, highest priority first.
    pub fn config_sources(config_path: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();

        sources.push(ConfigSource {
            label: "Environment",
            location: format!("{}*", ENV_PREFIX),
            found: std::env::vars().any(|(key, _)| key.starts_with(ENV_PREFIX)),
        });

        if let Some(path) = config_path {
            sources.push(ConfigSource {
                label: "Explicit",
                location: path.display().to_string(),
                found: path.exists(),
            });
        }

        sources.push(match Self::project_config_path() {
            Some(path) => ConfigSource {
                label: "Project",
                location: path.display().to_string(),
                found: true,
            },
            None => ConfigSource {
                label: "Project",
                location: PROJECT_FILES.map(|f| format!("./{}", f)).join(" or "),
                found: false,
            },
        });

        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource {
                label: "Global",
                location: path.display().to_string(),
                found: path.exists(),
            });
        }

        sources.push(ConfigSource {
            label: "Default",
            location: "built-in defaults".to_string(),
            found: true,
        });
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.gateway.endpoint.is_none());
        assert_eq!(config.driver.workers, 4);
    }

    #[test]
    fn test_global_config_path_names_app() {
        if let Some(path) = ConfigLoader::global_config_path() {
            assert!(path.to_string_lossy().contains(APP_DIR));
        }
    }

    #[test]
    fn test_later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("onboard.toml");
        fs::write(
            &global,
            "[gateway]\nendpoint = \"https://global.example\"\ntimeout_secs = 10\n",
        )
        .unwrap();
        fs::write(&project, "[gateway]\nendpoint = \"https://project.example\"\n").unwrap();

        let config: FileConfig = ConfigLoader::file_layers(Some(&global), Some(&project), None)
            .extract()
            .unwrap();
        assert_eq!(config.gateway.endpoint.as_deref(), Some("https://project.example"));
        assert_eq!(config.gateway.timeout_secs, 10);
        assert_eq!(config.validator.timeout_secs, 15);
    }

    #[test]
    fn test_missing_files_are_skipped_but_explicit_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.toml");

        let config: FileConfig = ConfigLoader::file_layers(Some(&absent), None, None)
            .extract()
            .unwrap();
        assert_eq!(config, FileConfig::default());

        assert!(matches!(
            ConfigLoader::load(Some(&absent)),
            Err(ConfigValidationError::MissingFile(_))
        ));
    }

    #[test]
    fn test_invalid_value_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[driver]\nworkers = \"many\"\n").unwrap();

        let result: Result<FileConfig, _> =
            ConfigLoader::file_layers(None, None, Some(&path)).extract();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_sources_end_with_defaults() {
        let sources = ConfigLoader::config_sources(None);
        let last = sources.last().unwrap();
        assert_eq!(last.label, "Default");
        assert!(last.found);
    }
}
