//! Command Runner Abstraction
//!
//! Every filesystem check and subprocess the indicator performs goes through
//! [`CommandRunner`]. [`SystemRunner`] talks to the real system, [`MockRunner`]
//! returns scripted output so the probe/query/launch logic can be tested
//! without NVIDIA tooling installed.
//!
//! ## Security
//!
//! `SystemRunner` only executes absolute paths and never goes through a shell,
//! so neither `PATH` nor argument contents can redirect what gets run.

use crate::{PrimeError, PrimeResult};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest first line read from a tool; anything past it is dropped.
pub const MAX_LINE_BYTES: u64 = 4096;

pub trait CommandRunner: Send + Sync {
    /// Check whether an executable exists at `path`.
    fn tool_exists(&self, path: &Path) -> bool;

    /// Run `program` and return the first line it writes to stdout, with the
    /// line terminator removed.
    ///
    /// `Ok(None)` means the process closed stdout without writing anything.
    fn read_line(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> PrimeResult<Option<String>>;

    /// Start `program` without waiting for it or capturing its output.
    fn spawn_detached(&self, program: &Path, args: &[&str]) -> PrimeResult<()>;
}

/// Extract the first line of raw stdout. `None` if nothing was written.
pub fn first_line(raw: &[u8]) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let end = raw.iter().position(|&b| b == b'\n').unwrap_or(raw.len());
    let line = String::from_utf8_lossy(&raw[..end]);
    Some(line.strip_suffix('\r').unwrap_or(&line).to_string())
}

fn program_name(program: &Path) -> String {
    program.display().to_string()
}

fn spawn_failure(program: &Path, reason: impl Into<String>) -> PrimeError {
    PrimeError::SpawnFailure {
        program: program_name(program),
        reason: reason.into(),
    }
}

/// Wait for `child` on a background thread so it never lingers as a zombie.
fn reap_in_background(mut child: Child, program: String) {
    let spawned = thread::Builder::new()
        .name("prime-reaper".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => debug!("{program} exited with {status}"),
            Err(e) => debug!("failed to wait for {program}: {e}"),
        });
    if let Err(e) = spawned {
        warn!("could not start reaper thread: {e}");
    }
}

/// Runner executing real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(program: &Path, args: &[&str]) -> PrimeResult<Command> {
        if !program.is_absolute() {
            return Err(spawn_failure(program, "refusing to run a non-absolute path"));
        }
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());
        Ok(command)
    }
}

impl CommandRunner for SystemRunner {
    fn tool_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_line(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> PrimeResult<Option<String>> {
        debug!("running {} {}", program.display(), args.join(" "));

        let mut child = Self::command(program, args)?
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_failure(program, e.to_string()))?;

        let Some(stdout) = child.stdout.take() else {
            reap_in_background(child, program_name(program));
            return Err(spawn_failure(program, "stdout was not captured"));
        };

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = BufReader::new(stdout.take(MAX_LINE_BYTES));
            let mut raw = Vec::new();
            let _ = tx.send(reader.read_until(b'\n', &mut raw).map(|_| raw));
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(raw)) => {
                reap_in_background(child, program_name(program));
                let line = first_line(&raw);
                debug!("{} answered {:?}", program.display(), line);
                Ok(line)
            }
            Ok(Err(e)) => {
                reap_in_background(child, program_name(program));
                Err(spawn_failure(program, format!("failed to read stdout: {e}")))
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("{} timed out after {:?}, killing it", program.display(), timeout);
                let _ = child.kill();
                let _ = child.wait();
                Err(PrimeError::Timeout {
                    program: program_name(program),
                    timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                reap_in_background(child, program_name(program));
                Err(spawn_failure(program, "stdout reader stopped unexpectedly"))
            }
        }
    }

    fn spawn_detached(&self, program: &Path, args: &[&str]) -> PrimeResult<()> {
        let child = Self::command(program, args)?
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_failure(program, e.to_string()))?;

        debug!("started {} (pid {})", program.display(), child.id());
        reap_in_background(child, program_name(program));
        Ok(())
    }
}

/// Scripted answer for a mocked command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutput {
    /// Raw bytes written to stdout before exiting.
    Stdout(String),
    /// The process could not be started.
    SpawnError(String),
    /// The process never answers.
    Hang,
}

/// Mock runner for testing
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    pub present_tools: Vec<PathBuf>,
    pub outputs: HashMap<String, MockOutput>,
    pub fail_launches: bool,
    reads: Arc<Mutex<Vec<String>>>,
    launched: Arc<Mutex<Vec<String>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both vendor tools installed, `prime-supported` answering `supported`
    /// and `query` answering `mode`.
    pub fn prime(supported: &str, mode: &str) -> Self {
        let config = crate::Config::default();
        Self::new()
            .with_tool(&config.settings_tool)
            .with_tool(&config.select_tool)
            .with_stdout(
                &config.support_command.program,
                &config.support_command.arg_refs(),
                supported,
            )
            .with_stdout(
                &config.query_command.program,
                &config.query_command.arg_refs(),
                mode,
            )
    }

    /// Nothing installed.
    pub fn bare() -> Self {
        Self::new()
    }

    pub fn with_tool(mut self, path: impl AsRef<Path>) -> Self {
        self.present_tools.push(path.as_ref().to_path_buf());
        self
    }

    pub fn without_tool(mut self, path: impl AsRef<Path>) -> Self {
        self.present_tools.retain(|p| p != path.as_ref());
        self
    }

    pub fn with_output(
        mut self,
        program: impl AsRef<Path>,
        args: &[&str],
        output: MockOutput,
    ) -> Self {
        self.outputs.insert(command_key(program.as_ref(), args), output);
        self
    }

    pub fn with_stdout(self, program: impl AsRef<Path>, args: &[&str], stdout: &str) -> Self {
        self.with_output(program, args, MockOutput::Stdout(stdout.to_string()))
    }

    pub fn with_failing_launches(mut self) -> Self {
        self.fail_launches = true;
        self
    }

    /// Command lines passed to `spawn_detached`, in order.
    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Number of `read_line` calls that would have spawned a process.
    pub fn spawned_reads(&self) -> usize {
        self.reads.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn record(log: &Mutex<Vec<String>>, entry: String) {
        if let Ok(mut log) = log.lock() {
            log.push(entry);
        }
    }
}

fn command_key(program: &Path, args: &[&str]) -> String {
    let mut key = program.display().to_string();
    for arg in args {
        key.push(' ');
        key.push_str(arg);
    }
    key
}

impl CommandRunner for MockRunner {
    fn tool_exists(&self, path: &Path) -> bool {
        self.present_tools.iter().any(|p| p == path)
    }

    fn read_line(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> PrimeResult<Option<String>> {
        let key = command_key(program, args);
        Self::record(&self.reads, key.clone());
        match self.outputs.get(&key) {
            Some(MockOutput::Stdout(raw)) => Ok(first_line(raw.as_bytes())),
            Some(MockOutput::SpawnError(reason)) => Err(spawn_failure(program, reason.clone())),
            Some(MockOutput::Hang) => Err(PrimeError::Timeout {
                program: program_name(program),
                timeout,
            }),
            None => Err(spawn_failure(program, "No such file or directory (os error 2)")),
        }
    }

    fn spawn_detached(&self, program: &Path, args: &[&str]) -> PrimeResult<()> {
        if self.fail_launches {
            return Err(spawn_failure(program, "No such file or directory (os error 2)"));
        }
        Self::record(&self.launched, command_key(program, args));
        Ok(())
    }
}
