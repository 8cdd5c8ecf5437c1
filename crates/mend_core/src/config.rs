//! Configuration loading.
//!
//! Settings come from an optional YAML or TOML file, then environment
//! overrides.

use std::fs;
use std::path::{Path, PathBuf};

use mend_assist::AssistantSettings;
use mend_deps::DependencySettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};

/// File names searched in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["mend.yaml", "mend.yml", "mend.toml"];

/// Python interpreter requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub python: String,
    pub major: u32,
    pub min_minor: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let deps = DependencySettings::default();
        Self {
            python: deps.python,
            major: deps.python_major,
            min_minor: deps.python_min_minor,
        }
    }
}

/// Local LLM runtime installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub runtime: String,
    pub install_script: String,
    pub service: String,
    pub required: bool,
    pub auto_install: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let deps = DependencySettings::default();
        Self {
            runtime: deps.llm_runtime,
            install_script: deps.llm_install_script,
            service: deps.llm_service,
            required: deps.llm_required,
            auto_install: deps.llm_auto_install,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MendConfig {
    pub assistant: AssistantSettings,
    pub runtime: RuntimeConfig,
    pub llm: LlmConfig,
}

impl MendConfig {
    /// Load from `path`, or from the first default file found in the
    /// working directory, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::discover(Path::new(".")) {
                Some(found) => Self::from_file(&found)?,
                None => {
                    debug!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// First default config file present in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Parse a file, choosing the format by extension. Unknown extensions
    /// are read as YAML.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?,
            _ => serde_yaml::from_str(&content)
                .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?,
        };
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `MEND_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(url) = get("MEND_ASSISTANT_URL") {
            self.assistant.endpoint = url;
        }
        if let Some(model) = get("MEND_ASSISTANT_MODEL") {
            self.assistant.model = model;
        }
        if let Some(python) = get("MEND_PYTHON") {
            self.runtime.python = python;
        }
        if let Some(runtime) = get("MEND_LLM_RUNTIME") {
            self.llm.service = runtime.clone();
            self.llm.runtime = runtime;
        }
    }

    /// Flatten into the dependency manager's settings.
    pub fn dependency_settings(&self) -> DependencySettings {
        DependencySettings {
            python: self.runtime.python.clone(),
            python_major: self.runtime.major,
            python_min_minor: self.runtime.min_minor,
            llm_runtime: self.llm.runtime.clone(),
            llm_install_script: self.llm.install_script.clone(),
            llm_service: self.llm.service.clone(),
            llm_required: self.llm.required,
            llm_auto_install: self.llm.auto_install,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MendConfig::default();
        assert_eq!(config.assistant.endpoint, "http://localhost:11434");
        assert_eq!(config.assistant.model, "codellama");
        assert_eq!(config.runtime.python, "python3");
        assert_eq!(config.dependency_settings(), DependencySettings::default());
    }

    #[test]
    fn test_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mend.yaml");
        fs::write(
            &path,
            "assistant:\n  model: deepseek-coder\nruntime:\n  min_minor: 10\n",
        )
        .unwrap();

        let config = MendConfig::from_file(&path).unwrap();
        assert_eq!(config.assistant.model, "deepseek-coder");
        assert_eq!(config.assistant.endpoint, "http://localhost:11434");
        assert_eq!(config.runtime.min_minor, 10);
        assert_eq!(config.runtime.major, 3);
    }

    #[test]
    fn test_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mend.toml");
        fs::write(
            &path,
            "[assistant]\nendpoint = \"http://gpu-box:11434\"\ntimeout_secs = 30\n\n[llm]\nauto_install = false\n",
        )
        .unwrap();

        let config = MendConfig::from_file(&path).unwrap();
        assert_eq!(config.assistant.endpoint, "http://gpu-box:11434");
        assert_eq!(config.assistant.timeout_secs, 30);
        assert!(!config.llm.auto_install);
        assert_eq!(config.llm.runtime, "ollama");
    }

    #[test]
    fn test_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mend.yaml");
        fs::write(&path, "assistant: [not, a, map]\n").unwrap();
        assert!(matches!(MendConfig::from_file(&path), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_discover() {
        let dir = TempDir::new().unwrap();
        assert!(MendConfig::discover(dir.path()).is_none());
        fs::write(dir.path().join("mend.toml"), "").unwrap();
        assert_eq!(
            MendConfig::discover(dir.path()),
            Some(dir.path().join("mend.toml"))
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MEND_ASSISTANT_URL", "http://10.0.0.2:11434"),
            ("MEND_PYTHON", "/usr/bin/python3.12"),
            ("MEND_ASSISTANT_MODEL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = MendConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.assistant.endpoint, "http://10.0.0.2:11434");
        assert_eq!(config.runtime.python, "/usr/bin/python3.12");
        assert_eq!(config.assistant.model, "codellama");
    }
}
