use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const SETTINGS_TOOL: &str = "/usr/bin/nvidia-settings";
pub const SELECT_TOOL: &str = "/usr/bin/prime-select";

/// A fixed command line. Never built from user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }

    /// Human readable form for logs and diagnostics.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            if arg.contains(' ') {
                line.push_str(&format!(" \"{arg}\""));
            } else {
                line.push(' ');
                line.push_str(arg);
            }
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Vendor settings application; must exist for the applet to be usable.
    pub settings_tool: PathBuf,
    /// PRIME selection tool; must exist for the applet to be usable.
    pub select_tool: PathBuf,
    pub read_timeout_ms: u64,
    /// Role claimed with the host's system tray manager.
    pub role: String,
    pub uuid: String,
    pub support_command: CommandSpec,
    pub query_command: CommandSpec,
    pub settings_command: CommandSpec,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_tool: PathBuf::from(SETTINGS_TOOL),
            select_tool: PathBuf::from(SELECT_TOOL),
            read_timeout_ms: 5_000,
            role: "nvidia-prime".to_string(),
            uuid: "nvidia-prime@cinnamon.org".to_string(),
            support_command: CommandSpec::new(SELECT_TOOL, &["prime-supported"]),
            query_command: CommandSpec::new(SELECT_TOOL, &["query"]),
            settings_command: CommandSpec::new(SETTINGS_TOOL, &["-page", "PRIME Profiles"]),
        }
    }
}

impl Config {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// A zero timeout would expire before any tool could answer, so it is
    /// raised to 1 ms.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = (timeout.as_millis() as u64).max(1);
        self
    }

    pub fn required_tools(&self) -> [&PathBuf; 2] {
        [&self.settings_tool, &self.select_tool]
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
