use crate::probe::Capability;
use crate::query::GpuMode;
use crate::PrimeResult;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIcon {
    Nvidia,
    Intel,
    Error,
}

impl StatusIcon {
    /// Icon theme name.
    pub fn icon_name(&self) -> &'static str {
        match self {
            StatusIcon::Nvidia => "prime-applet-nvidia",
            StatusIcon::Intel => "prime-applet-intel",
            StatusIcon::Error => "dialog-error",
        }
    }

    /// Symbolic icons follow the panel's text color instead of using their own.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, StatusIcon::Error)
    }
}

impl fmt::Display for StatusIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.icon_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    pub icon: StatusIcon,
    pub tooltip: String,
}

pub const TOOLTIP_NOT_INSTALLED: &str = "The NVIDIA drivers are not properly installed. \
    Please install nvidia-settings and nvidia-prime.";
pub const TOOLTIP_NOT_SUPPORTED: &str = "NVIDIA prime is not supported by your hardware.";

impl DisplayState {
    fn new(icon: StatusIcon, tooltip: impl Into<String>) -> Self {
        Self {
            icon,
            tooltip: tooltip.into(),
        }
    }

    /// Map a probe result, and the mode query if one ran, to what the panel shows.
    pub fn from_results(capability: &Capability, mode: Option<&PrimeResult<GpuMode>>) -> Self {
        match capability {
            Capability::Unsupported { .. } => Self::new(StatusIcon::Error, TOOLTIP_NOT_INSTALLED),
            Capability::NotSwitchable { .. } => Self::new(StatusIcon::Error, TOOLTIP_NOT_SUPPORTED),
            Capability::Switchable => match mode {
                Some(Ok(mode)) => Self::from_mode(mode),
                Some(Err(e)) => Self::new(
                    StatusIcon::Error,
                    format!("Active graphics card: unknown ({e})"),
                ),
                None => Self::new(StatusIcon::Error, "Active graphics card: unknown"),
            },
        }
    }

    pub fn from_mode(mode: &GpuMode) -> Self {
        let icon = match mode {
            GpuMode::Nvidia => StatusIcon::Nvidia,
            GpuMode::Intel => StatusIcon::Intel,
            GpuMode::Unknown(_) => StatusIcon::Error,
        };
        Self::new(icon, format!("Active graphics card: {mode}"))
    }
}
