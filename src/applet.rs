//! Panel applet composition
//!
//! `PrimeApplet` wires the probe, querier and launcher to a host panel. The
//! host owns rendering, the popup menu and the tray role; the applet only
//! tells it what to show and reacts to menu actions.

use crate::config::Config;
use crate::display::{DisplayState, StatusIcon};
use crate::launcher::ActionLauncher;
use crate::probe::{Capability, CapabilityProbe};
use crate::query::ModeQuerier;
use crate::runner::CommandRunner;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MenuAction {
    OpenSettings,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::OpenSettings => "NVIDIA Settings",
        }
    }
}

/// Panel/tray surface the applet draws on.
pub trait PanelHost {
    fn set_icon(&mut self, icon: StatusIcon);
    fn set_tooltip(&mut self, tooltip: &str);
    /// Add an entry to the applet's popup menu.
    fn add_action(&mut self, action: MenuAction);
}

/// System tray role bookkeeping provided by the desktop shell.
pub trait RoleRegistry {
    fn register_role(&mut self, role: &str, uuid: &str) -> anyhow::Result<()>;
    fn unregister_role(&mut self, role: &str, uuid: &str) -> anyhow::Result<()>;
}

pub struct PrimeApplet<R: CommandRunner> {
    config: Config,
    runner: R,
    capability: Option<Capability>,
    state: Option<DisplayState>,
    actions_added: bool,
    registered: bool,
}

impl<R: CommandRunner> PrimeApplet<R> {
    pub fn new(config: Config, runner: R) -> Self {
        Self {
            config,
            runner,
            capability: None,
            state: None,
            actions_added: false,
            registered: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn capability(&self) -> Option<&Capability> {
        self.capability.as_ref()
    }

    /// Most recently displayed state.
    pub fn state(&self) -> Option<&DisplayState> {
        self.state.as_ref()
    }

    /// Probe, query if switchable, and map the outcome to a display state.
    pub fn evaluate(&self) -> (Capability, DisplayState) {
        let capability = CapabilityProbe::new(&self.config, &self.runner).probe();
        let mode = capability
            .is_switchable()
            .then(|| ModeQuerier::new(&self.config, &self.runner).query());

        if let Some(Err(e)) = &mode {
            warn!("could not query active GPU: {e}");
        }

        let state = DisplayState::from_results(&capability, mode.as_ref());
        (capability, state)
    }

    pub fn init(
        &mut self,
        host: &mut dyn PanelHost,
        registry: &mut dyn RoleRegistry,
    ) -> DisplayState {
        match registry.register_role(&self.config.role, &self.config.uuid) {
            Ok(()) => self.registered = true,
            Err(e) => warn!("could not register tray role {}: {e:#}", self.config.role),
        }
        self.refresh(host)
    }

    /// Recompute the state and push it to the host.
    pub fn refresh(&mut self, host: &mut dyn PanelHost) -> DisplayState {
        let (capability, state) = self.evaluate();
        info!("{} ({})", state.tooltip, state.icon);

        host.set_icon(state.icon);
        host.set_tooltip(&state.tooltip);

        if capability.tools_present() && !self.actions_added {
            host.add_action(MenuAction::OpenSettings);
            self.actions_added = true;
        }

        self.capability = Some(capability);
        self.state = Some(state.clone());
        state
    }

    pub fn activate(&self, action: MenuAction) {
        debug!("menu action {:?}", action);
        match action {
            MenuAction::OpenSettings => {
                ActionLauncher::new(&self.runner).open_settings(&self.config)
            }
        }
    }

    pub fn teardown(&mut self, registry: &mut dyn RoleRegistry) {
        if !self.registered {
            return;
        }
        if let Err(e) = registry.unregister_role(&self.config.role, &self.config.uuid) {
            warn!("could not release tray role {}: {e:#}", self.config.role);
        }
        self.registered = false;
    }
}
