//! Deterministic applet tests using the mock runner
//!
//! These tests don't require nvidia-prime or nvidia-settings to be installed.

use prime_indicator::runner::{MockOutput, MockRunner};
use prime_indicator::{
    Capability, Config, DisplayState, MenuAction, PanelHost, PrimeApplet, RoleRegistry,
    StatusIcon,
};

// ============================================================================
// Test hosts
// ============================================================================

#[derive(Default)]
struct RecordingPanel {
    icon: Option<StatusIcon>,
    tooltip: Option<String>,
    actions: Vec<MenuAction>,
    updates: usize,
}

impl PanelHost for RecordingPanel {
    fn set_icon(&mut self, icon: StatusIcon) {
        self.icon = Some(icon);
        self.updates += 1;
    }

    fn set_tooltip(&mut self, tooltip: &str) {
        self.tooltip = Some(tooltip.to_string());
    }

    fn add_action(&mut self, action: MenuAction) {
        self.actions.push(action);
    }
}

#[derive(Default)]
struct RecordingRoles {
    calls: Vec<String>,
}

impl RoleRegistry for RecordingRoles {
    fn register_role(&mut self, role: &str, uuid: &str) -> anyhow::Result<()> {
        self.calls.push(format!("register {role} {uuid}"));
        Ok(())
    }

    fn unregister_role(&mut self, role: &str, uuid: &str) -> anyhow::Result<()> {
        self.calls.push(format!("unregister {role} {uuid}"));
        Ok(())
    }
}

fn init_with(runner: MockRunner) -> (PrimeApplet<MockRunner>, RecordingPanel, DisplayState) {
    let mut applet = PrimeApplet::new(Config::default(), runner);
    let mut panel = RecordingPanel::default();
    let mut roles = RecordingRoles::default();
    let state = applet.init(&mut panel, &mut roles);
    (applet, panel, state)
}

// ============================================================================
// Lifecycle scenarios
// ============================================================================

#[test]
fn test_nvidia_active_end_to_end() {
    let (applet, panel, state) = init_with(MockRunner::prime("yes\n", "nvidia\n"));

    assert_eq!(
        state,
        DisplayState {
            icon: StatusIcon::Nvidia,
            tooltip: "Active graphics card: NVIDIA".to_string(),
        }
    );
    assert_eq!(panel.icon, Some(StatusIcon::Nvidia));
    assert_eq!(panel.tooltip.as_deref(), Some("Active graphics card: NVIDIA"));
    assert_eq!(panel.actions, vec![MenuAction::OpenSettings]);
    assert_eq!(applet.state(), Some(&state));
    assert_eq!(applet.capability(), Some(&Capability::Switchable));
}

#[test]
fn test_intel_active() {
    let (_, panel, state) = init_with(MockRunner::prime("yes\n", "intel\n"));

    assert_eq!(state.icon, StatusIcon::Intel);
    assert_eq!(panel.tooltip.as_deref(), Some("Active graphics card: Intel"));
}

#[test]
fn test_unknown_mode_shows_raw_answer() {
    let (_, panel, state) = init_with(MockRunner::prime("yes\n", "on-demand\n"));

    assert_eq!(state.icon, StatusIcon::Error);
    assert_eq!(panel.tooltip.as_deref(), Some("Active graphics card: on-demand"));
    // Tools are present, so the settings entry is still offered.
    assert_eq!(panel.actions, vec![MenuAction::OpenSettings]);
}

#[test]
fn test_silent_query_is_an_error_not_unknown() {
    let (_, _, state) = init_with(MockRunner::prime("yes\n", ""));

    assert_eq!(state.icon, StatusIcon::Error);
    assert!(state.tooltip.starts_with("Active graphics card: unknown"));
    assert!(state.tooltip.contains("without writing any output"));
}

#[test]
fn test_hung_query_degrades() {
    let runner = MockRunner::prime("yes\n", "nvidia\n").with_output(
        "/usr/bin/prime-select",
        &["query"],
        MockOutput::Hang,
    );
    let (_, _, state) = init_with(runner);

    assert_eq!(state.icon, StatusIcon::Error);
    assert!(state.tooltip.contains("did not answer"));
}

#[test]
fn test_not_switchable() {
    let (applet, panel, state) = init_with(MockRunner::prime("no\n", "nvidia\n"));

    assert_eq!(state.icon, StatusIcon::Error);
    assert_eq!(
        state.tooltip,
        "NVIDIA prime is not supported by your hardware."
    );
    assert_eq!(panel.actions, vec![MenuAction::OpenSettings]);
    // The mode is never queried on unsupported hardware.
    assert_eq!(applet.runner().spawned_reads(), 1);
}

#[test]
fn test_drivers_missing() {
    let (applet, panel, state) = init_with(MockRunner::bare());

    assert_eq!(state.icon, StatusIcon::Error);
    assert_eq!(
        state.tooltip,
        "The NVIDIA drivers are not properly installed. \
         Please install nvidia-settings and nvidia-prime."
    );
    assert!(panel.actions.is_empty());
    assert_eq!(applet.runner().spawned_reads(), 0);
}

#[test]
fn test_settings_action_launches_prime_page() {
    let runner = MockRunner::prime("yes\n", "intel\n");
    let (applet, _, _) = init_with(runner.clone());

    applet.activate(MenuAction::OpenSettings);

    assert_eq!(
        runner.launched(),
        vec!["/usr/bin/nvidia-settings -page PRIME Profiles".to_string()]
    );
}

#[test]
fn test_failed_launch_does_not_disturb_display() {
    let runner = MockRunner::prime("yes\n", "intel\n").with_failing_launches();
    let (applet, _, state) = init_with(runner);

    applet.activate(MenuAction::OpenSettings);

    assert_eq!(applet.state(), Some(&state));
    assert!(applet.runner().launched().is_empty());
}

#[test]
fn test_role_registered_and_released() {
    let mut applet = PrimeApplet::new(Config::default(), MockRunner::prime("yes\n", "nvidia\n"));
    let mut panel = RecordingPanel::default();
    let mut roles = RecordingRoles::default();

    applet.init(&mut panel, &mut roles);
    assert_eq!(roles.calls, vec!["register nvidia-prime nvidia-prime@cinnamon.org"]);

    applet.teardown(&mut roles);
    applet.teardown(&mut roles);
    assert_eq!(
        roles.calls,
        vec![
            "register nvidia-prime nvidia-prime@cinnamon.org",
            "unregister nvidia-prime nvidia-prime@cinnamon.org",
        ]
    );
}

#[test]
fn test_refresh_picks_up_new_mode() {
    let config = Config::default();
    let mut applet = PrimeApplet::new(config.clone(), MockRunner::prime("yes\n", "intel\n"));
    let mut panel = RecordingPanel::default();

    applet.refresh(&mut panel);
    assert_eq!(panel.icon, Some(StatusIcon::Intel));

    // A fresh applet over a runner that now reports nvidia.
    let mut applet = PrimeApplet::new(config, MockRunner::prime("yes\n", "nvidia\n"));
    applet.refresh(&mut panel);
    assert_eq!(panel.icon, Some(StatusIcon::Nvidia));
    assert_eq!(panel.updates, 2);
}
