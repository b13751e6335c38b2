use crate::config::{CommandSpec, Config};
use crate::runner::CommandRunner;
use std::path::Path;
use tracing::{error, info};

/// Fire-and-forget process launcher for menu actions.
pub struct ActionLauncher<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> ActionLauncher<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Start `program` and return immediately. Failures are only logged.
    pub fn launch(&self, program: &Path, args: &[&str]) {
        match self.runner.spawn_detached(program, args) {
            Ok(()) => info!("launched {} {}", program.display(), args.join(" ")),
            Err(e) => error!("failed to launch {}: {e}", program.display()),
        }
    }

    pub fn launch_spec(&self, command: &CommandSpec) {
        self.launch(&command.program, &command.arg_refs());
    }

    /// Open the vendor settings tool on its PRIME page.
    pub fn open_settings(&self, config: &Config) {
        self.launch_spec(&config.settings_command);
    }
}
