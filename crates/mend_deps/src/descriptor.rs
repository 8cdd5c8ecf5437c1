//! Dependency descriptors and settings.

use serde::{Deserialize, Serialize};

/// How a dependency's presence is determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Probe {
    /// The Python interpreter, gated on its major/minor version.
    PythonRuntime,
    /// pip, invoked through the configured interpreter.
    Pip,
    /// Any executable answering `--version`.
    Binary { executable: String },
}

/// A dependency the pipeline knows how to probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    pub name: String,
    pub required: bool,
    /// Whether a missing instance may be installed without asking.
    pub auto_install: bool,
    pub probe: Probe,
}

impl DependencyDescriptor {
    pub fn new(name: impl Into<String>, probe: Probe) -> Self {
        Self {
            name: name.into(),
            required: false,
            auto_install: false,
            probe,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn auto_install(mut self) -> Self {
        self.auto_install = true;
        self
    }
}

/// Result of probing one dependency. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyStatus {
    pub name: String,
    pub required: bool,
    pub auto_install: bool,
    pub installed: bool,
    /// Version text reported by the probe, when it ran.
    pub version: Option<String>,
}

/// Outcome of probing an importable Python module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleStatus {
    Present,
    Missing,
    /// The import machinery itself failed (not a plain absence).
    ImportFailed(String),
}

/// One attempt made by [`crate::DependencyManager::auto_install_missing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallAttempt {
    pub name: String,
    pub success: bool,
}

/// Dependency configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencySettings {
    /// Python interpreter used for probes and pip.
    pub python: String,
    /// Required major version of the interpreter.
    pub python_major: u32,
    /// Minimum minor version of the interpreter.
    pub python_min_minor: u32,
    /// Local LLM runtime executable.
    pub llm_runtime: String,
    /// Vendor install script, piped to `sh`.
    pub llm_install_script: String,
    /// Service started after installing the runtime.
    pub llm_service: String,
    pub llm_required: bool,
    pub llm_auto_install: bool,
}

impl Default for DependencySettings {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            python_major: 3,
            python_min_minor: 8,
            llm_runtime: "ollama".to_string(),
            llm_install_script: "https://ollama.ai/install.sh".to_string(),
            llm_service: "ollama".to_string(),
            llm_required: false,
            llm_auto_install: true,
        }
    }
}

impl DependencySettings {
    /// Descriptors for the interpreter, pip and the LLM runtime.
    pub fn descriptors(&self) -> Vec<DependencyDescriptor> {
        let mut runtime = DependencyDescriptor::new(
            self.llm_runtime.clone(),
            Probe::Binary {
                executable: self.llm_runtime.clone(),
            },
        );
        runtime.required = self.llm_required;
        runtime.auto_install = self.llm_auto_install;

        vec![
            DependencyDescriptor::new("python", Probe::PythonRuntime).required(),
            DependencyDescriptor::new("pip", Probe::Pip).required(),
            runtime,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_descriptors() {
        let descriptors = DependencySettings::default().descriptors();
        let names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["python", "pip", "ollama"]);

        assert!(descriptors[0].required && !descriptors[0].auto_install);
        assert!(!descriptors[2].required && descriptors[2].auto_install);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: DependencySettings =
            serde_yaml::from_str("python: /usr/bin/python3.12\npython_min_minor: 10\n").unwrap();
        assert_eq!(settings.python, "/usr/bin/python3.12");
        assert_eq!(settings.python_min_minor, 10);
        assert_eq!(settings.python_major, 3);
        assert_eq!(settings.llm_runtime, "ollama");
    }
}
