//! Device profiles: everything that differs between router families

use super::checks::{Check, Layout, Probe};
use crate::error::{Result, WardenError};
use crate::models::{LabelSemantics, Severity};
use crate::session::LoginForm;

/// Login form, frame layout and check sequence of one device family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub name: String,
    pub description: String,
    pub login: LoginForm,
    pub layout: Layout,
    /// Checks in the order they must run
    pub checks: Vec<Check>,
}

/// Profiles shipped with Warden
pub const BUILTIN_PROFILES: &[&str] = &["tplink"];

impl DeviceProfile {
    /// Looks up a built-in profile by name
    pub fn by_name(name: &str, labels: &LabelSemantics) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "tplink" | "tp-link" => Ok(Self::tplink(labels.clone())),
            other => Err(WardenError::ConfigError(format!(
                "Unknown device profile '{other}' (available: {})",
                BUILTIN_PROFILES.join(", ")
            ))),
        }
    }

    /// TP-Link frameset interface (menu in `bottomLeftFrame`, pages in `mainFrame`)
    pub fn tplink(labels: LabelSemantics) -> Self {
        Self {
            name: "tplink".to_string(),
            description: "TP-Link routers with the classic frameset web interface".to_string(),
            login: LoginForm {
                password_control: "pcPassword".to_string(),
                ready_context: "bottomLeftFrame".to_string(),
            },
            layout: Layout {
                menu_context: "bottomLeftFrame".to_string(),
                content_context: "mainFrame".to_string(),
            },
            checks: vec![
                toggle(
                    "ssid-broadcast",
                    "SSID broadcast",
                    &["menu_wl"],
                    "ssidBroadcast",
                    false,
                    ("SSID is hidden", "SSID broadcast is enabled (hiding it is recommended)"),
                    Severity::Warning,
                ),
                Check {
                    id: "wireless-security".to_string(),
                    name: "Wireless security mode".to_string(),
                    menu_path: vec!["menu_wlsec".to_string()],
                    probe: Probe::SecurityMode {
                        group: "secType".to_string(),
                        strong_value: "3".to_string(),
                        disabled_value: "0".to_string(),
                    },
                },
                Check {
                    id: "wps".to_string(),
                    name: "WPS".to_string(),
                    menu_path: vec!["menu_wlqss".to_string()],
                    probe: Probe::ActionLabel {
                        control: "qssSwitch".to_string(),
                        semantics: labels,
                        secure: "WPS is disabled".to_string(),
                        insecure: "WPS is enabled (risk)".to_string(),
                    },
                },
                toggle(
                    "spi-firewall",
                    "SPI firewall",
                    &["menu_security"],
                    "enable_spi",
                    true,
                    ("SPI firewall is enabled", "SPI firewall is disabled (risk)"),
                    Severity::Danger,
                ),
                toggle(
                    "wan-ping",
                    "WAN ping blocking",
                    &["menu_ddos"],
                    "wanPingFilter",
                    true,
                    ("WAN ping is blocked", "Router answers ping from the WAN"),
                    Severity::Warning,
                ),
                toggle(
                    "mac-filtering",
                    "Wireless MAC filtering",
                    &["menu_wl", "menu_wlacl"],
                    "acl_en",
                    true,
                    ("Wireless MAC filtering is enabled", "Wireless MAC filtering is not used"),
                    Severity::Warning,
                ),
                toggle(
                    "guest-network",
                    "Guest network",
                    &["menu_wlguest"],
                    "guestDis",
                    true,
                    ("Guest network is disabled", "Guest network is enabled (risk)"),
                    Severity::Danger,
                ),
            ],
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn toggle(
    id: &str,
    name: &str,
    menu_path: &[&str],
    control: &str,
    expected: bool,
    (success, failure): (&str, &str),
    failure_severity: Severity,
) -> Check {
    Check {
        id: id.to_string(),
        name: name.to_string(),
        menu_path: menu_path.iter().map(|m| m.to_string()).collect(),
        probe: Probe::Toggle {
            control: control.to_string(),
            expected,
            success: success.to_string(),
            failure: failure.to_string(),
            failure_severity,
        },
    }
}
