use crate::config::Config;
use crate::runner::CommandRunner;
use crate::PrimeError;
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Whether PRIME switching can be used on this machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Capability {
    /// At least one required tool is not installed.
    Unsupported { missing: Vec<PathBuf> },
    /// Tools are installed but `prime-supported` did not answer `yes`.
    ///
    /// `cause` is `UnexpectedOutput` when the tool answered something else,
    /// or the spawn/timeout error when it could not be run.
    NotSwitchable {
        detail: String,
        #[serde(serialize_with = "error_text")]
        cause: PrimeError,
    },
    Switchable,
}

fn error_text<S: Serializer>(error: &PrimeError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

impl Capability {
    pub fn is_switchable(&self) -> bool {
        matches!(self, Capability::Switchable)
    }

    pub fn tools_present(&self) -> bool {
        !matches!(self, Capability::Unsupported { .. })
    }

    /// The error behind a degraded capability, for diagnostics.
    pub fn as_error(&self) -> Option<PrimeError> {
        match self {
            Capability::Unsupported { missing } => {
                missing.first().cloned().map(PrimeError::MissingTool)
            }
            Capability::NotSwitchable { cause, .. } => Some(cause.clone()),
            Capability::Switchable => None,
        }
    }
}

pub struct CapabilityProbe<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
}

impl<'a> CapabilityProbe<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    pub fn missing_tools(&self) -> Vec<PathBuf> {
        self.config
            .required_tools()
            .into_iter()
            .filter(|path| !self.runner.tool_exists(path))
            .cloned()
            .collect()
    }

    /// Check the tools, then ask `prime-supported`. Never fails: a tool that
    /// cannot be run makes the machine `NotSwitchable` with the reason attached.
    pub fn probe(&self) -> Capability {
        let missing = self.missing_tools();
        if !missing.is_empty() {
            warn!("missing PRIME tools: {:?}", missing);
            return Capability::Unsupported { missing };
        }

        let command = &self.config.support_command;
        let answer = self.runner.read_line(
            &command.program,
            &command.arg_refs(),
            self.config.read_timeout(),
        );

        match answer {
            Ok(Some(line)) if line == "yes" => Capability::Switchable,
            Ok(line) => {
                let detail = line.unwrap_or_default();
                debug!("{} answered {:?}", command.display(), detail);
                Capability::NotSwitchable {
                    cause: PrimeError::UnexpectedOutput {
                        program: command.display(),
                        output: detail.clone(),
                    },
                    detail,
                }
            }
            Err(e) => {
                warn!("support query failed: {e}");
                Capability::NotSwitchable {
                    detail: e.to_string(),
                    cause: e,
                }
            }
        }
    }
}
