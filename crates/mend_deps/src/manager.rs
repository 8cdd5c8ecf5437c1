//! Dependency probing, gating and installation.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::descriptor::{
    DependencyDescriptor, DependencySettings, DependencyStatus, InstallAttempt, ModuleStatus,
    Probe,
};
use crate::error::{DependencyError, DependencyResult};
use crate::executor::{CommandExecutor, SystemExecutor};

/// Exits 0 when the module can be located, 1 when it cannot, 2 when the
/// lookup itself raised. `find_spec` locates without importing.
const FIND_SPEC_SCRIPT: &str = "import importlib.util, sys\n\
try:\n    sys.exit(0 if importlib.util.find_spec(sys.argv[1]) else 1)\n\
except Exception as exc:\n    print(exc, file=sys.stderr)\n    sys.exit(2)\n";

/// Probes and installs the pipeline's dependencies.
///
/// Probes are re-run on every call because installs may happen out of band.
/// Install operations report failure as `false` instead of erroring.
pub struct DependencyManager {
    executor: Arc<dyn CommandExecutor>,
    settings: DependencySettings,
    descriptors: Vec<DependencyDescriptor>,
    version_pattern: Regex,
    package_pattern: Regex,
}

impl DependencyManager {
    /// Create a manager with the default descriptors for `settings`.
    pub fn new(executor: Arc<dyn CommandExecutor>, settings: DependencySettings) -> Self {
        let descriptors = settings.descriptors();
        Self {
            executor,
            settings,
            descriptors,
            version_pattern: Regex::new(r"(\d+)\.(\d+)").expect("static version pattern compiles"),
            package_pattern: Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$")
                .expect("static package pattern compiles"),
        }
    }

    /// Create a manager that runs real processes.
    pub fn system(settings: DependencySettings) -> Self {
        Self::new(Arc::new(SystemExecutor::new()), settings)
    }

    /// Replace the descriptor set.
    pub fn with_descriptors(mut self, descriptors: Vec<DependencyDescriptor>) -> Self {
        self.descriptors = descriptors;
        self
    }

    pub fn descriptors(&self) -> &[DependencyDescriptor] {
        &self.descriptors
    }

    pub fn settings(&self) -> &DependencySettings {
        &self.settings
    }

    /// Probe one dependency by name.
    pub fn check(&self, name: &str) -> DependencyResult<DependencyStatus> {
        self.descriptors
            .iter()
            .find(|d| d.name == name)
            .map(|d| self.probe(d))
            .ok_or_else(|| DependencyError::Unknown(name.to_string()))
    }

    /// Probe every descriptor and return the required ones only.
    pub fn check_all(&self) -> BTreeMap<String, bool> {
        self.report()
            .into_iter()
            .filter(|status| status.required)
            .map(|status| (status.name, status.installed))
            .collect()
    }

    /// Probe every descriptor.
    pub fn report(&self) -> Vec<DependencyStatus> {
        self.descriptors.iter().map(|d| self.probe(d)).collect()
    }

    /// Install a Python package with pip. Returns `false` on any failure.
    pub fn install(&self, name: &str, version: Option<&str>) -> bool {
        if !self.package_pattern.is_match(name) {
            warn!("Refusing to install invalid package name: {:?}", name);
            return false;
        }

        let requirement = match version {
            Some(version) => format!("{}=={}", name, version),
            None => name.to_string(),
        };
        info!("Installing package: {}", requirement);

        match self
            .executor
            .run(&self.settings.python, &["-m", "pip", "install", &requirement])
        {
            Ok(output) if output.success() => {
                info!("Successfully installed {}", requirement);
                true
            }
            Ok(output) => {
                error!(
                    "pip install {} failed with exit code {}: {}",
                    requirement,
                    output.exit_code,
                    output.last_error_line()
                );
                false
            }
            Err(e) => {
                error!("pip install {} could not run: {}", requirement, e);
                false
            }
        }
    }

    /// Install a system-level dependency through its vendor script.
    ///
    /// Succeeds when the binary probes as present afterwards. Starting the
    /// associated service is best effort.
    pub fn install_system_dependency(&self, name: &str) -> bool {
        if name != self.settings.llm_runtime {
            warn!("No system installer known for {}", name);
            return false;
        }

        let script = format!("curl -fsSL {} | sh", self.settings.llm_install_script);
        info!("Installing system dependency {} via {}", name, self.settings.llm_install_script);

        match self.executor.run("sh", &["-c", &script]) {
            Ok(output) if output.success() => {}
            Ok(output) => {
                error!(
                    "Install script for {} exited with code {}: {}",
                    name,
                    output.exit_code,
                    output.last_error_line()
                );
                return false;
            }
            Err(e) => {
                error!("Install script for {} could not run: {}", name, e);
                return false;
            }
        }

        match self
            .executor
            .run("systemctl", &["start", &self.settings.llm_service])
        {
            Ok(output) if output.success() => {
                info!("Started service {}", self.settings.llm_service)
            }
            Ok(output) => warn!(
                "Could not start service {}: {}",
                self.settings.llm_service,
                output.last_error_line()
            ),
            Err(e) => warn!("Service manager unavailable: {}", e),
        }

        let installed = self.binary_present(&self.settings.llm_runtime).0;
        if installed {
            info!("System dependency {} installed", name);
        } else {
            error!("{} still not found after running its installer", name);
        }
        installed
    }

    /// Attempt system installation of every absent auto-installable dependency.
    ///
    /// Individual failures are logged and do not stop the batch.
    pub fn auto_install_missing(&self) -> Vec<InstallAttempt> {
        let mut attempts = Vec::new();

        for descriptor in self.descriptors.iter().filter(|d| d.auto_install) {
            if self.probe(descriptor).installed {
                continue;
            }
            info!("Auto-installing missing dependency: {}", descriptor.name);
            let success = self.install_system_dependency(&descriptor.name);
            if !success {
                warn!("Auto-install of {} failed, continuing", descriptor.name);
            }
            attempts.push(InstallAttempt {
                name: descriptor.name.clone(),
                success,
            });
        }

        attempts
    }

    /// Pre-flight gate over required dependencies.
    ///
    /// A required dependency that is absent fails the gate unless it is
    /// auto-installable and its installation succeeds.
    pub fn gate(&self) -> DependencyResult<()> {
        let mut missing = Vec::new();

        for descriptor in self.descriptors.iter().filter(|d| d.required) {
            if self.probe(descriptor).installed {
                continue;
            }
            if descriptor.auto_install {
                warn!(
                    "Required dependency {} missing, attempting installation",
                    descriptor.name
                );
                if self.install_system_dependency(&descriptor.name) {
                    continue;
                }
            }
            error!("Required dependency missing: {}", descriptor.name);
            missing.push(descriptor.name.clone());
        }

        if missing.is_empty() {
            info!("Dependency gate passed");
            Ok(())
        } else {
            Err(DependencyError::MissingRequired(missing))
        }
    }

    /// Check whether a Python module can be located by the interpreter.
    pub fn module_status(&self, module: &str) -> ModuleStatus {
        match self
            .executor
            .run(&self.settings.python, &["-c", FIND_SPEC_SCRIPT, module])
        {
            Ok(output) if output.exit_code == 0 => ModuleStatus::Present,
            Ok(output) if output.exit_code == 1 => ModuleStatus::Missing,
            Ok(output) => ModuleStatus::ImportFailed(output.last_error_line().to_string()),
            Err(e) => ModuleStatus::ImportFailed(e.to_string()),
        }
    }

    fn probe(&self, descriptor: &DependencyDescriptor) -> DependencyStatus {
        let (installed, version) = match &descriptor.probe {
            Probe::PythonRuntime => self.python_present(),
            Probe::Pip => self.pip_present(),
            Probe::Binary { executable } => self.binary_present(executable),
        };

        debug!(
            "Probed {}: installed={} version={:?}",
            descriptor.name, installed, version
        );

        DependencyStatus {
            name: descriptor.name.clone(),
            required: descriptor.required,
            auto_install: descriptor.auto_install,
            installed,
            version,
        }
    }

    fn python_present(&self) -> (bool, Option<String>) {
        let output = match self.executor.run(&self.settings.python, &["--version"]) {
            Ok(output) if output.success() => output,
            _ => return (false, None),
        };

        // Older interpreters print the version on stderr.
        let text = output.combined_output().trim().to_string();
        let Some(caps) = self.version_pattern.captures(&text) else {
            return (false, Some(text));
        };
        let major: u32 = caps[1].parse().unwrap_or(0);
        let minor: u32 = caps[2].parse().unwrap_or(0);

        let supported =
            major == self.settings.python_major && minor >= self.settings.python_min_minor;
        if !supported {
            warn!(
                "Python {}.{} found, need {}.{}+",
                major, minor, self.settings.python_major, self.settings.python_min_minor
            );
        }
        (supported, Some(text))
    }

    fn pip_present(&self) -> (bool, Option<String>) {
        match self
            .executor
            .run(&self.settings.python, &["-m", "pip", "--version"])
        {
            Ok(output) if output.success() => (true, first_line(&output.stdout)),
            _ => (false, None),
        }
    }

    fn binary_present(&self, executable: &str) -> (bool, Option<String>) {
        match self.executor.run(executable, &["--version"]) {
            Ok(output) if output.success() => (true, first_line(&output.combined_output())),
            _ => (false, None),
        }
    }
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockExecutor, MockResponse};

    fn manager(executor: &MockExecutor) -> DependencyManager {
        DependencyManager::new(Arc::new(executor.clone()), DependencySettings::default())
    }

    #[test]
    fn test_python_version_gate() {
        for (reported, expected) in [
            ("Python 3.11.4", true),
            ("Python 3.8.0", true),
            ("Python 3.7.9", false),
            ("Python 2.7.18", false),
            ("Python 4.0.0", false),
            ("garbage", false),
        ] {
            let executor =
                MockExecutor::new().on("python3 --version", MockResponse::success(reported));
            let status = manager(&executor).check("python").unwrap();
            assert_eq!(status.installed, expected, "{}", reported);
        }
    }

    #[test]
    fn test_python_version_on_stderr() {
        let executor = MockExecutor::new().on(
            "python3 --version",
            MockResponse::Output(crate::CommandOutput::new(0, "", "Python 3.9.1\n")),
        );
        let status = manager(&executor).check("python").unwrap();
        assert!(status.installed);
        assert_eq!(status.version.as_deref(), Some("Python 3.9.1"));
    }

    #[test]
    fn test_pip_probe() {
        let executor = MockExecutor::new().on(
            "python3 -m pip --version",
            MockResponse::success("pip 24.0 from /usr/lib/python3/dist-packages/pip (python 3.11)\n"),
        );
        let status = manager(&executor).check("pip").unwrap();
        assert!(status.installed);
        assert!(status.version.unwrap().starts_with("pip 24.0"));

        let failing =
            MockExecutor::new().on("python3 -m pip --version", MockResponse::failure(1, "No module named pip"));
        assert!(!manager(&failing).check("pip").unwrap().installed);
    }

    #[test]
    fn test_unknown_dependency() {
        let executor = MockExecutor::new();
        assert!(matches!(
            manager(&executor).check("node"),
            Err(DependencyError::Unknown(_))
        ));
    }

    #[test]
    fn test_install_package() {
        let executor = MockExecutor::new()
            .on("python3 -m pip install requests", MockResponse::success("Successfully installed"));
        let deps = manager(&executor);

        assert!(deps.install("requests", None));
        assert!(executor.was_called("python3 -m pip install requests"));
    }

    #[test]
    fn test_install_pinned_version() {
        let executor = MockExecutor::new().on(
            "python3 -m pip install 'requests==2.31.0'",
            MockResponse::success(""),
        );
        assert!(manager(&executor).install("requests", Some("2.31.0")));
    }

    #[test]
    fn test_install_failure_returns_false() {
        let executor = MockExecutor::new().on(
            "python3 -m pip install nosuchpkg",
            MockResponse::failure(1, "ERROR: No matching distribution found for nosuchpkg"),
        );
        assert!(!manager(&executor).install("nosuchpkg", None));

        let no_python = MockExecutor::new();
        assert!(!manager(&no_python).install("requests", None));
    }

    #[test]
    fn test_install_rejects_option_like_names() {
        let executor = MockExecutor::new().on("python3", MockResponse::success(""));
        let deps = manager(&executor);
        assert!(!deps.install("--index-url=http://evil", None));
        assert!(!deps.install("", None));
        assert_eq!(executor.call_count(), 0);
    }

    #[test]
    fn test_module_status() {
        let executor = MockExecutor::new()
            .on_match(
                |_, args| args.last().map(String::as_str) == Some("os"),
                MockResponse::success(""),
            )
            .on_match(
                |_, args| args.last().map(String::as_str) == Some("foo"),
                MockResponse::failure(1, ""),
            )
            .on_match(
                |_, args| args.last().map(String::as_str) == Some("broken"),
                MockResponse::failure(2, "ValueError: broken.__spec__ is None"),
            );
        let deps = manager(&executor);

        assert_eq!(deps.module_status("os"), ModuleStatus::Present);
        assert_eq!(deps.module_status("foo"), ModuleStatus::Missing);
        assert_eq!(
            deps.module_status("broken"),
            ModuleStatus::ImportFailed("ValueError: broken.__spec__ is None".to_string())
        );
    }
}
