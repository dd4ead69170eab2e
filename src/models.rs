//! Core data models for Warden audits

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Severity tag attached to every finding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }

    /// Parses a severity name as accepted on the command line
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "success" => Some(Severity::Success),
            "warning" => Some(Severity::Warning),
            "danger" => Some(Severity::Danger),
            _ => None,
        }
    }

    /// Parses a `--fail-on` threshold; only warning and danger qualify
    pub fn parse_threshold(value: &str) -> Option<Self> {
        Self::parse(value).filter(|severity| *severity != Severity::Success)
    }

    /// Returns the color name for terminal output
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Success => "green",
            Severity::Warning => "yellow",
            Severity::Danger => "red",
        }
    }
}

/// One severity-tagged observation produced by a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(Severity::Danger, message)
    }
}

/// Administrator credential for a device
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// Unused by TP-Link, kept for device families that ask for one
    pub username: Option<String>,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Device under audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Host name, IP address or full URL of the administrative interface
    pub address: String,
    pub credential: Credential,
}

impl Target {
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credential: Credential {
                username: None,
                password: password.into(),
            },
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.credential.username = Some(username.into());
        self
    }

    /// URL of the login page; bare hosts are served over plain HTTP
    pub fn base_url(&self) -> crate::error::Result<Url> {
        let address = self.address.trim();
        if address.starts_with("http://") || address.starts_with("https://") {
            Ok(Url::parse(address)?)
        } else {
            Ok(Url::parse(&format!("http://{address}"))?)
        }
    }
}

/// How an audit terminated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// Every check in the sequence was attempted
    Completed,
    /// A fatal error stopped the audit early
    Aborted,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Completed => write!(f, "completed"),
            AuditOutcome::Aborted => write!(f, "aborted"),
        }
    }
}

/// Result of auditing one device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Address of the audited device
    pub target: String,
    /// Device profile the checks came from
    pub profile: String,
    /// Unique audit identifier
    pub audit_id: String,
    /// Audit start time (local timezone)
    pub started_at: DateTime<Local>,
    /// Audit end time (local timezone)
    pub finished_at: Option<DateTime<Local>>,
    pub outcome: AuditOutcome,
    /// Findings in check execution order
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn new(target: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            profile: profile.into(),
            audit_id: uuid::Uuid::new_v4().to_string(),
            started_at: Local::now(),
            finished_at: None,
            outcome: AuditOutcome::Completed,
            findings: Vec::new(),
        }
    }

    /// Returns count of findings by severity
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Whether any finding is at or above the given severity
    pub fn has_at_least(&self, threshold: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= threshold)
    }

    /// Marks the audit as finished
    pub fn finish(&mut self, outcome: AuditOutcome) {
        self.outcome = outcome;
        self.finished_at = Some(Local::now());
    }
}

/// Configuration for an audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Device profile name
    pub profile: String,
    /// Bounded wait applied to every element and frame lookup, in seconds
    pub implicit_wait_secs: u64,
    /// Poll interval used while waiting for elements, in milliseconds
    pub poll_interval_ms: u64,
    /// Delay after submitting the login form, in milliseconds
    pub settle_ms: u64,
    /// Run the browser without a window
    pub headless: bool,
    /// Explicit Chromium binary
    pub chrome_executable: Option<String>,
    /// Deadline for a whole audit, in seconds
    pub deadline_secs: Option<u64>,
    /// Devices audited at once when several targets are given
    pub concurrency: usize,
    /// Wording of the WPS button label
    pub labels: LabelSemantics,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            profile: "tplink".to_string(),
            implicit_wait_secs: 10,
            poll_interval_ms: 250,
            settle_ms: 2000,
            headless: true,
            chrome_executable: None,
            deadline_secs: None,
            concurrency: 4,
            labels: LabelSemantics::default(),
        }
    }
}

/// How a push-button label maps onto the feature's real state.
///
/// When `inverted` is set the label names the action the button performs,
/// so a label reading the enabled word means the feature is currently off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSemantics {
    pub inverted: bool,
    pub enabled_word: String,
    pub disabled_word: String,
}

impl Default for LabelSemantics {
    fn default() -> Self {
        Self {
            inverted: true,
            enabled_word: "Enable".to_string(),
            disabled_word: "Disable".to_string(),
        }
    }
}

impl LabelSemantics {
    fn reads_enabled(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        label.contains(&self.enabled_word.to_lowercase())
            && !label.contains(&self.disabled_word.to_lowercase())
    }

    fn reads_disabled(&self, label: &str) -> bool {
        label
            .to_lowercase()
            .contains(&self.disabled_word.to_lowercase())
    }

    /// Whether the label shows the feature in its secure (off) state
    pub fn is_secure(&self, label: &str) -> bool {
        if self.inverted {
            self.reads_enabled(label)
        } else {
            self.reads_disabled(label)
        }
    }
}
