//! Check definitions and their evaluation
//!
//! A check navigates the menu frame, focuses the content frame, takes one
//! reading and turns it into exactly one finding. Reading is the only part
//! that touches the session; [`Probe::evaluate`] is a pure function of the
//! reading.

use crate::error::{Result, WardenError};
use crate::models::{Finding, LabelSemantics, Severity};
use crate::session::{DriverError, Interaction, Observation, UiSession};

/// Outcome of one check: its finding, or the error that stopped it
pub type CheckOutcome = Result<Finding>;

/// Frames a device family splits its interface into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Frame holding the navigation menu
    pub menu_context: String,
    /// Frame where settings pages are rendered
    pub content_context: String,
}

/// One atomic inspection of a configuration control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// Short identifier shown in `warden checks`
    pub id: String,
    /// Human-readable name used in failure messages
    pub name: String,
    /// Menu items clicked, in order, before the control is read
    pub menu_path: Vec<String>,
    pub probe: Probe,
}

/// What a check reads and how it scores the reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Checkbox or radio button compared against an expected state
    Toggle {
        control: String,
        expected: bool,
        success: String,
        failure: String,
        failure_severity: Severity,
    },
    /// Radio group selecting the wireless security mode
    SecurityMode {
        group: String,
        strong_value: String,
        disabled_value: String,
    },
    /// Push button whose label encodes the feature state
    ActionLabel {
        control: String,
        semantics: LabelSemantics,
        secure: String,
        insecure: String,
    },
}

/// Raw state observed for a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    Matched(bool),
    Selected(Option<String>),
    Label(String),
}

impl Probe {
    /// Element the probe reads, used to name failures
    pub fn control(&self) -> &str {
        match self {
            Probe::Toggle { control, .. } | Probe::ActionLabel { control, .. } => control,
            Probe::SecurityMode { group, .. } => group,
        }
    }

    /// Reads the control from the focused content frame
    pub async fn observe(&self, session: &mut UiSession) -> Result<Reading> {
        match self {
            Probe::Toggle {
                control, expected, ..
            } => {
                let observation = session
                    .read_or_toggle(control, Interaction::Expect(*expected))
                    .await?;
                toggle_reading(control, observation)
            }
            Probe::SecurityMode { group, .. } => {
                Ok(Reading::Selected(session.selected_value(group).await?))
            }
            Probe::ActionLabel { control, .. } => Ok(Reading::Label(session.label(control).await?)),
        }
    }

    /// Scores a reading
    pub fn evaluate(&self, reading: &Reading) -> Finding {
        match (self, reading) {
            (
                Probe::Toggle {
                    success,
                    failure,
                    failure_severity,
                    ..
                },
                Reading::Matched(matched),
            ) => {
                if *matched {
                    Finding::success(success.as_str())
                } else {
                    Finding::new(*failure_severity, failure.as_str())
                }
            }
            (
                Probe::SecurityMode {
                    strong_value,
                    disabled_value,
                    ..
                },
                Reading::Selected(selected),
            ) => match selected.as_deref() {
                Some(v) if v == strong_value => {
                    Finding::success("WPA2/WPA3-Personal wireless security in use")
                }
                Some(v) if v == disabled_value => {
                    Finding::danger("Wireless security is disabled (critical risk)")
                }
                Some(v) => Finding::warning(format!("Weak wireless security: mode {v}")),
                None => Finding::warning("Weak wireless security: no mode selected"),
            },
            (
                Probe::ActionLabel {
                    semantics,
                    secure,
                    insecure,
                    ..
                },
                Reading::Label(label),
            ) => {
                if semantics.is_secure(label) {
                    Finding::success(secure.as_str())
                } else {
                    Finding::danger(insecure.as_str())
                }
            }
            (probe, reading) => Finding::warning(format!(
                "Unexpected reading {reading:?} for control '{}'",
                probe.control()
            )),
        }
    }
}

/// A toggle read must come back as a comparison, never as a click
fn toggle_reading(control: &str, observation: Observation) -> Result<Reading> {
    match observation {
        Observation::Matched(matched) => Ok(Reading::Matched(matched)),
        Observation::Navigated => Err(WardenError::Lookup {
            control: control.to_string(),
            source: DriverError::Protocol("control was clicked instead of read".to_string()),
        }),
    }
}

impl Check {
    /// Navigates to the check's page and scores its control
    pub async fn run(&self, session: &mut UiSession, layout: &Layout) -> CheckOutcome {
        for item in &self.menu_path {
            session.focus(&layout.menu_context).await?;
            session.read_or_toggle(item, Interaction::Navigate).await?;
        }
        session.focus(&layout.content_context).await?;
        let reading = self.probe.observe(session).await?;
        Ok(self.probe.evaluate(&reading))
    }
}
