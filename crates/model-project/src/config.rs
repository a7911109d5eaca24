//! Loader configuration

use std::fs;
use std::path::Path;

use model_extensions::BuildTarget;
use model_fs::DEFAULT_SETTINGS_FILES;
use model_loader::ModelLoader;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Name of the serial worker thread when none is configured.
pub const DEFAULT_SERIAL_THREAD_NAME: &str = "model-project";

/// Configuration of project loading, read from TOML.
///
/// ```toml
/// [target]
/// tool_version = "8.5.0"
/// runtime_version = "17"
///
/// [loader]
/// serial_thread_name = "model-project"
/// settings_files = ["settings.gradle", "settings.gradle.kts"]
/// ```
///
/// Every key is optional; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub target: BuildTarget,
    pub loader: LoaderSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderSection {
    /// Name given to each project's serial worker thread.
    pub serial_thread_name: String,
    /// Settings file names probed, in order, to find the enclosing build.
    pub settings_files: Vec<String>,
}

impl Default for LoaderSection {
    fn default() -> Self {
        Self {
            serial_thread_name: DEFAULT_SERIAL_THREAD_NAME.to_string(),
            settings_files: DEFAULT_SETTINGS_FILES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl LoaderConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LoaderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| model_fs::Error::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// The loader described by this configuration.
    pub fn model_loader(&self) -> ModelLoader {
        ModelLoader::new(self.target.clone()).with_settings_files(self.loader.settings_files.clone())
    }

    fn validate(&self) -> Result<()> {
        if self.loader.serial_thread_name.trim().is_empty() {
            return Err(Error::config("loader.serial_thread_name must not be empty"));
        }
        if let Some(name) = self.loader.settings_files.iter().find(|name| name.trim().is_empty()) {
            return Err(Error::config(format!("loader.settings_files contains an empty name: {name:?}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use semver::Version;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_is_default() {
        let config = LoaderConfig::from_toml_str("").unwrap();
        assert_eq!(config, LoaderConfig::default());
        assert_eq!(config.loader.serial_thread_name, "model-project");
        assert_eq!(config.target, BuildTarget::default());
    }

    #[test]
    fn test_full_config() {
        let config = LoaderConfig::from_toml_str(
            r#"
[target]
tool_version = "7.6.1"
runtime_version = "11"

[loader]
serial_thread_name = "gradle-loader"
settings_files = ["settings.gradle"]
"#,
        )
        .unwrap();

        assert_eq!(config.target.tool_version, Version::new(7, 6, 1));
        assert_eq!(config.target.runtime_version, "11");
        assert_eq!(config.loader.serial_thread_name, "gradle-loader");
        assert_eq!(config.model_loader().settings_files(), &["settings.gradle".to_string()]);
        assert_eq!(config.model_loader().target().tool_version, Version::new(7, 6, 1));
    }

    #[rstest]
    #[case::unknown_section("[cache]\nsize = 3\n")]
    #[case::unknown_key("[loader]\nthreads = 3\n")]
    #[case::bad_version("[target]\ntool_version = \"eight\"\nruntime_version = \"17\"\n")]
    fn test_malformed_config_is_rejected(#[case] content: &str) {
        let err = LoaderConfig::from_toml_str(content).unwrap_err();
        assert!(matches!(err, Error::TomlDe(_)), "got: {err}");
    }

    #[rstest]
    #[case::empty_thread_name("[loader]\nserial_thread_name = \" \"\n")]
    #[case::empty_settings_name("[loader]\nsettings_files = [\"settings.gradle\", \"\"]\n")]
    fn test_unusable_values_are_rejected(#[case] content: &str) {
        let err = LoaderConfig::from_toml_str(content).unwrap_err();
        assert!(matches!(err, Error::Config { .. }), "got: {err}");
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("loader.toml");
        std::fs::write(&path, "[loader]\nserial_thread_name = \"from-file\"\n").unwrap();

        let config = LoaderConfig::load(&path).unwrap();
        assert_eq!(config.loader.serial_thread_name, "from-file");
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = LoaderConfig::load(temp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }
}
