//! Deps command - Report and install dependencies.

use anyhow::Result;
use clap::Args;
use tracing::info;

use mend_core::{CoreError, MendConfig};
use mend_deps::{DependencyError, DependencyManager, DependencyStatus};

#[derive(Args)]
pub struct DepsArgs {
    /// Install missing auto-installable dependencies
    #[arg(short, long)]
    install: bool,
}

pub async fn execute(args: DepsArgs, config: &MendConfig) -> Result<()> {
    info!("Checking dependencies");

    let deps = DependencyManager::system(config.dependency_settings());

    if args.install {
        let attempts = deps.auto_install_missing();
        if attempts.is_empty() {
            println!("Nothing to install");
        }
        for attempt in &attempts {
            let mark = if attempt.success { "✅" } else { "❌" };
            println!("{} Installed {}", mark, attempt.name);
        }
        println!();
    }

    let report = deps.report();
    println!("📦 Dependencies:");
    for status in &report {
        println!("{}", describe(status));
    }

    let missing = missing_required(&report);
    if missing.is_empty() {
        println!("\n✅ All required dependencies are available");
        Ok(())
    } else {
        Err(CoreError::GateFailed(DependencyError::MissingRequired(missing)).into())
    }
}

fn describe(status: &DependencyStatus) -> String {
    let mark = match (status.installed, status.required) {
        (true, _) => "✅",
        (false, true) => "❌",
        (false, false) => "⚠️ ",
    };
    let role = if status.required { "required" } else { "optional" };
    let version = status.version.as_deref().unwrap_or("not found");
    format!("   {} {:<10} {:<9} {}", mark, status.name, role, version)
}

fn missing_required(report: &[DependencyStatus]) -> Vec<String> {
    report
        .iter()
        .filter(|s| s.required && !s.installed)
        .map(|s| s.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(name: &str, required: bool, installed: bool) -> DependencyStatus {
        DependencyStatus {
            name: name.to_string(),
            required,
            auto_install: false,
            installed,
            version: installed.then(|| format!("{} 1.0", name)),
        }
    }

    #[test]
    fn test_missing_required_ignores_optional() {
        let report = vec![
            status("python", true, true),
            status("pip", true, false),
            status("ollama", false, false),
        ];
        assert_eq!(missing_required(&report), vec!["pip"]);
    }

    #[test]
    fn test_describe() {
        let line = describe(&status("ollama", false, false));
        assert!(line.contains("ollama"));
        assert!(line.contains("optional"));
        assert!(line.contains("not found"));
    }
}
