use crate::config::Config;
use crate::runner::CommandRunner;
use crate::{PrimeError, PrimeResult};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// GPU currently selected by `prime-select`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "raw", rename_all = "snake_case")]
pub enum GpuMode {
    Nvidia,
    Intel,
    /// The tool ran but answered something else.
    Unknown(String),
}

impl GpuMode {
    /// Classify one line of `prime-select query` output.
    pub fn parse(line: &str) -> Self {
        match line {
            "nvidia" => GpuMode::Nvidia,
            "intel" => GpuMode::Intel,
            other => GpuMode::Unknown(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, GpuMode::Unknown(_))
    }

    /// Turn `Unknown` into an `UnexpectedOutput` error.
    pub fn expect_known(self, program: &str) -> PrimeResult<GpuMode> {
        match self {
            GpuMode::Unknown(output) => Err(PrimeError::UnexpectedOutput {
                program: program.to_string(),
                output,
            }),
            known => Ok(known),
        }
    }
}

impl fmt::Display for GpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuMode::Nvidia => write!(f, "NVIDIA"),
            GpuMode::Intel => write!(f, "Intel"),
            GpuMode::Unknown(raw) => write!(f, "{raw}"),
        }
    }
}

pub struct ModeQuerier<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
}

impl<'a> ModeQuerier<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Run the query command once and classify its first line.
    ///
    /// A process that could not be run, or that closed stdout without saying
    /// anything, is a `SpawnFailure`; it is never reported as `Unknown`.
    pub fn query(&self) -> PrimeResult<GpuMode> {
        let command = &self.config.query_command;
        let line = self.runner.read_line(
            &command.program,
            &command.arg_refs(),
            self.config.read_timeout(),
        )?;

        match line {
            Some(line) => {
                let mode = GpuMode::parse(&line);
                debug!("active GPU mode: {mode:?}");
                Ok(mode)
            }
            None => Err(PrimeError::SpawnFailure {
                program: command.display(),
                reason: "exited without writing any output".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{MockOutput, MockRunner};

    fn query_with(runner: &MockRunner) -> PrimeResult<GpuMode> {
        let config = Config::default();
        ModeQuerier::new(&config, runner).query()
    }

    #[test]
    fn test_parse() {
        assert_eq!(GpuMode::parse("nvidia"), GpuMode::Nvidia);
        assert_eq!(GpuMode::parse("intel"), GpuMode::Intel);
        assert_eq!(GpuMode::parse("on-demand"), GpuMode::Unknown("on-demand".to_string()));
        assert_eq!(GpuMode::parse(" nvidia"), GpuMode::Unknown(" nvidia".to_string()));
        assert_eq!(GpuMode::parse(""), GpuMode::Unknown(String::new()));
    }

    #[test]
    fn test_query_classification() {
        assert_eq!(query_with(&MockRunner::prime("yes\n", "nvidia\n")), Ok(GpuMode::Nvidia));
        assert_eq!(query_with(&MockRunner::prime("yes\n", "intel\n")), Ok(GpuMode::Intel));
        assert_eq!(
            query_with(&MockRunner::prime("yes\n", "weird\n")),
            Ok(GpuMode::Unknown("weird".to_string()))
        );
        assert_eq!(
            query_with(&MockRunner::prime("yes\n", "\n")),
            Ok(GpuMode::Unknown(String::new()))
        );
    }

    #[test]
    fn test_no_output_is_not_unknown() {
        let result = query_with(&MockRunner::prime("yes\n", ""));
        assert!(matches!(result, Err(PrimeError::SpawnFailure { .. })));
    }

    #[test]
    fn test_spawn_failure() {
        let runner = MockRunner::prime("yes\n", "nvidia\n").with_output(
            "/usr/bin/prime-select",
            &["query"],
            MockOutput::SpawnError("No such file or directory (os error 2)".to_string()),
        );
        assert!(matches!(query_with(&runner), Err(PrimeError::SpawnFailure { .. })));
    }

    #[test]
    fn test_expect_known() {
        assert_eq!(GpuMode::Intel.expect_known("prime-select"), Ok(GpuMode::Intel));
        assert_eq!(
            GpuMode::Unknown("weird".to_string()).expect_known("prime-select"),
            Err(PrimeError::UnexpectedOutput {
                program: "prime-select".to_string(),
                output: "weird".to_string(),
            })
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(GpuMode::Nvidia.to_string(), "NVIDIA");
        assert_eq!(GpuMode::Intel.to_string(), "Intel");
        assert_eq!(GpuMode::Unknown("hybrid".to_string()).to_string(), "hybrid");
    }
}
