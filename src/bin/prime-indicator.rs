use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prime_indicator::error_messages::{print_error_with_solution, run_diagnostics};
use prime_indicator::{
    CapabilityProbe, CommandRunner, Config, MenuAction, ModeQuerier, PanelHost, PrimeApplet,
    PrimeError, RoleRegistry, StatusIcon, SystemRunner,
};
use serde::Serialize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "prime-indicator",
    version,
    about = "NVIDIA PRIME status indicator",
    long_about = None
)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// How long to wait for prime-select to answer
    #[arg(
        long,
        global = true,
        value_name = "MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show what the panel indicator displays (default)
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Check whether PRIME switching is available
    Probe {
        #[arg(long)]
        json: bool,
    },
    /// Print the active GPU
    Query {
        /// Fail on answers other than nvidia/intel
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        json: bool,
    },
    /// Open NVIDIA Settings on the PRIME Profiles page
    Settings,
    /// Diagnose the PRIME setup
    Doctor,
    /// Print the effective configuration
    Config,
}

/// Panel host that prints instead of drawing.
#[derive(Default, Serialize)]
struct ConsolePanel {
    icon: Option<StatusIcon>,
    icon_name: Option<&'static str>,
    symbolic: bool,
    tooltip: String,
    actions: Vec<&'static str>,
}

impl PanelHost for ConsolePanel {
    fn set_icon(&mut self, icon: StatusIcon) {
        self.icon = Some(icon);
        self.icon_name = Some(icon.icon_name());
        self.symbolic = icon.is_symbolic();
    }

    fn set_tooltip(&mut self, tooltip: &str) {
        self.tooltip = tooltip.to_string();
    }

    fn add_action(&mut self, action: MenuAction) {
        self.actions.push(action.label());
    }
}

/// A one-shot CLI run has no tray manager to claim a role from.
struct NoRoles;

impl RoleRegistry for NoRoles {
    fn register_role(&mut self, role: &str, uuid: &str) -> Result<()> {
        tracing::debug!("skipping tray role {role} for {uuid}");
        Ok(())
    }

    fn unregister_role(&mut self, _role: &str, _uuid: &str) -> Result<()> {
        Ok(())
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn run(command: Command, config: Config) -> Result<()> {
    let runner = SystemRunner::new();

    match command {
        Command::Status { json } => {
            let mut applet = PrimeApplet::new(config, runner);
            let mut panel = ConsolePanel::default();
            let mut roles = NoRoles;
            applet.init(&mut panel, &mut roles);
            applet.teardown(&mut roles);

            if json {
                print_json(&panel)?;
            } else {
                let kind = if panel.symbolic { " (symbolic)" } else { "" };
                println!("icon:    {}{kind}", panel.icon_name.unwrap_or("none"));
                println!("tooltip: {}", panel.tooltip);
                for action in &panel.actions {
                    println!("menu:    {action}");
                }
            }
        }
        Command::Probe { json } => {
            let capability = CapabilityProbe::new(&config, &runner).probe();
            if json {
                print_json(&capability)?;
            } else if let Some(err) = capability.as_error() {
                println!("PRIME switching: unavailable");
                return Err(err.into());
            } else {
                println!("PRIME switching: available");
            }
        }
        Command::Query { strict, json } => {
            let mut mode = ModeQuerier::new(&config, &runner).query()?;
            if strict {
                mode = mode.expect_known(&config.query_command.display())?;
            }
            if json {
                print_json(&mode)?;
            } else {
                println!("Active graphics card: {mode}");
            }
        }
        Command::Settings => {
            if !runner.tool_exists(&config.settings_tool) {
                return Err(PrimeError::MissingTool(config.settings_tool.clone()).into());
            }
            let applet = PrimeApplet::new(config, runner);
            applet.activate(MenuAction::OpenSettings);
        }
        Command::Doctor => {
            print!("{}", run_diagnostics(&config, &runner));
        }
        Command::Config => {
            let text = config.to_toml().context("failed to serialize configuration")?;
            print!("{text}");
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::default();
    if let Some(ms) = cli.timeout_ms {
        config = config.with_read_timeout(Duration::from_millis(ms));
    }

    let command = cli.command.unwrap_or(Command::Status { json: false });
    if let Err(e) = run(command, config) {
        match e.downcast_ref::<PrimeError>() {
            Some(err) => print_error_with_solution(err),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
