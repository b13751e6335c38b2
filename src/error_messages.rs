/// Error Messages with Solutions
///
/// User-facing explanations for the CLI, plus the `doctor` diagnostics report.
use crate::config::Config;
use crate::display::DisplayState;
use crate::probe::{Capability, CapabilityProbe};
use crate::query::ModeQuerier;
use crate::runner::CommandRunner;
use crate::PrimeError;
use console::style;
use std::path::Path;

pub trait ErrorWithSolution {
    fn with_solution(&self) -> String;
}

fn render(title: &str, details: &str, causes: &[&str], solutions: &[&str]) -> String {
    let mut out = format!(
        "{} {}\n\n{}\n{}\n",
        style("❌ Error:").red().bold(),
        style(title).bold(),
        style("Details:").yellow(),
        details
    );
    for cause in causes {
        out.push_str(&format!("  • {cause}\n"));
    }
    out.push_str(&format!("\n{}\n", style("💡 Solutions:").green().bold()));
    for (i, solution) in solutions.iter().enumerate() {
        out.push_str(&format!(
            "  {} {solution}\n",
            style(format!("{}.", i + 1)).cyan().bold()
        ));
    }
    out
}

impl ErrorWithSolution for PrimeError {
    fn with_solution(&self) -> String {
        match self {
            PrimeError::MissingTool(path) => render(
                "NVIDIA PRIME tools not installed",
                &format!("{} does not exist", path.display()),
                &[
                    "nvidia-prime package not installed",
                    "nvidia-settings package not installed",
                ],
                &[
                    "Install the tools: sudo apt install nvidia-prime nvidia-settings",
                    "Run: prime-indicator doctor",
                ],
            ),
            PrimeError::SpawnFailure { program, reason } => render(
                "Could not run PRIME tool",
                &format!("{program}: {reason}"),
                &["Tool is not executable", "Tool crashed before answering"],
                &[
                    &format!("Run it by hand to see its error: {program}"),
                    "Reinstall nvidia-prime",
                ],
            ),
            PrimeError::Timeout { program, timeout } => render(
                "PRIME tool did not answer",
                &format!("{program} gave no answer within {timeout:?}"),
                &["Tool is waiting for input or a lock"],
                &[
                    "Retry with a longer timeout: prime-indicator --timeout-ms 15000",
                    &format!("Run it by hand: {program}"),
                ],
            ),
            PrimeError::UnexpectedOutput { program, output } => render(
                "Unexpected answer from PRIME tool",
                &format!("{program} answered {output:?}"),
                &[
                    "Hardware has no switchable graphics",
                    "Newer nvidia-prime with modes this tool does not know (e.g. on-demand)",
                ],
                &["Open NVIDIA Settings: prime-indicator settings"],
            ),
        }
    }
}

/// Print error with solution
pub fn print_error_with_solution(error: &PrimeError) {
    eprintln!("\n{}\n", error.with_solution());
}

fn tool_line(runner: &dyn CommandRunner, path: &Path) -> String {
    if runner.tool_exists(path) {
        return format!("   ✅ {}\n", path.display());
    }
    let mut line = format!("   ❌ {} not found\n", path.display());
    let elsewhere = path
        .file_name()
        .and_then(|name| which::which(name).ok())
        .filter(|found| found != path);
    if let Some(found) = elsewhere {
        line.push_str(&format!(
            "   ⚠️  {} is on PATH but only {} is used\n",
            found.display(),
            path.display()
        ));
    }
    line
}

/// Diagnostic report for `prime-indicator doctor`.
pub fn run_diagnostics(config: &Config, runner: &dyn CommandRunner) -> String {
    let mut output = format!(
        "\n{}\n\n",
        style("🔍 prime-indicator Diagnostics").cyan().bold()
    );

    output.push_str(&format!("{}\n", style("1. Required tools:").yellow().bold()));
    for path in config.required_tools() {
        output.push_str(&tool_line(runner, path));
    }

    output.push_str(&format!("\n{}\n", style("2. PRIME support:").yellow().bold()));
    let capability = CapabilityProbe::new(config, runner).probe();
    match &capability {
        Capability::Switchable => output.push_str("   ✅ switchable graphics supported\n"),
        Capability::NotSwitchable {
            cause: PrimeError::UnexpectedOutput { program, output: answer },
            ..
        } => {
            output.push_str(&format!("   ❌ not supported ({program} answered {answer:?})\n"));
        }
        Capability::NotSwitchable { cause, .. } => {
            output.push_str(&format!("   ❌ could not check support: {cause}\n"));
        }
        Capability::Unsupported { .. } => {
            output.push_str("   ⏭️  skipped, tools missing\n");
            output.push_str("   💡 Install: sudo apt install nvidia-prime nvidia-settings\n");
        }
    }

    output.push_str(&format!("\n{}\n", style("3. Active GPU:").yellow().bold()));
    let mode = capability
        .is_switchable()
        .then(|| ModeQuerier::new(config, runner).query());
    match &mode {
        Some(Ok(mode)) if mode.is_known() => output.push_str(&format!("   ✅ {mode}\n")),
        Some(Ok(mode)) => output.push_str(&format!("   ⚠️  unrecognized answer {mode:?}\n")),
        Some(Err(e)) => output.push_str(&format!("   ❌ {e}\n")),
        None => output.push_str("   ⏭️  skipped\n"),
    }

    let state = DisplayState::from_results(&capability, mode.as_ref());
    output.push_str(&format!("\n{}\n", style("4. Panel:").yellow().bold()));
    output.push_str(&format!("   icon:    {}\n", state.icon));
    output.push_str(&format!("   tooltip: {}\n", state.tooltip));

    output.push_str(&format!(
        "\n{}\n",
        style("━━━━━━━━━━━━━━━━━━━━━━━━━━━━").cyan()
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{MockOutput, MockRunner};
    use std::path::PathBuf;

    #[test]
    fn test_error_with_solution() {
        let error = PrimeError::MissingTool(PathBuf::from("/usr/bin/prime-select"));
        let solution = error.with_solution();
        assert!(solution.contains("Solutions"));
        assert!(solution.contains("nvidia-prime"));
        assert!(solution.contains("/usr/bin/prime-select"));
    }

    #[test]
    fn test_diagnostics_switchable() {
        let diag = run_diagnostics(&Config::default(), &MockRunner::prime("yes\n", "nvidia\n"));
        assert!(diag.contains("Diagnostics"));
        assert!(diag.contains("switchable graphics supported"));
        assert!(diag.contains("Active graphics card: NVIDIA"));
    }

    #[test]
    fn test_diagnostics_unrunnable_support_check() {
        let runner = MockRunner::prime("yes\n", "nvidia\n").with_output(
            "/usr/bin/prime-select",
            &["prime-supported"],
            MockOutput::SpawnError("Permission denied (os error 13)".to_string()),
        );
        let diag = run_diagnostics(&Config::default(), &runner);
        assert!(diag.contains("could not check support"));
        assert!(diag.contains("Permission denied"));
        assert!(!diag.contains("answered"));

        let diag = run_diagnostics(&Config::default(), &MockRunner::prime("no\n", "nvidia\n"));
        assert!(diag.contains("/usr/bin/prime-select prime-supported answered \"no\""));
    }

    #[test]
    fn test_diagnostics_missing_tools() {
        let diag = run_diagnostics(&Config::default(), &MockRunner::bare());
        assert!(diag.contains("/usr/bin/nvidia-settings not found"));
        assert!(diag.contains("skipped, tools missing"));
        assert!(diag.contains("dialog-error"));
    }
}
