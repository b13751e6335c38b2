use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimeError {
    #[error("required tool not found: {}", .0.display())]
    MissingTool(PathBuf),
    #[error("could not run {program}: {reason}")]
    SpawnFailure { program: String, reason: String },
    #[error("{program} did not answer within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("{program} returned unexpected output: {output:?}")]
    UnexpectedOutput { program: String, output: String },
}

pub type PrimeResult<T> = Result<T, PrimeError>;

pub mod applet;
pub mod config;
pub mod display;
pub mod error_messages;
pub mod launcher;
pub mod probe;
pub mod query;
pub mod runner;

// Re-export commonly used types
pub use applet::{MenuAction, PanelHost, PrimeApplet, RoleRegistry};
pub use config::Config;
pub use display::{DisplayState, StatusIcon};
pub use launcher::ActionLauncher;
pub use probe::{Capability, CapabilityProbe};
pub use query::{GpuMode, ModeQuerier};
pub use runner::{CommandRunner, MockRunner, SystemRunner};
