//! The remote UI-driving capability consumed by sessions
//!
//! Anything that can load a page, switch between frames, find elements by
//! id or name and read or change their state can back an audit. The
//! Chromium implementation lives in [`super::browser`]; tests provide an
//! in-memory device.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a driving capability
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("{what} not present after {waited_ms} ms")]
    Timeout { what: String, waited_ms: u64 },

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("DevTools protocol error: {0}")]
    Protocol(String),

    #[error(
        "Browser automation requires the 'browser' feature flag. \
         Compile with: cargo build --features browser"
    )]
    Unsupported,
}

/// How an element is addressed inside the active document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Id(String),
    Name(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Locator::Id(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Locator::Name(value.into())
    }

    pub fn value(&self) -> &str {
        match self {
            Locator::Id(v) | Locator::Name(v) => v,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "#{v}"),
            Locator::Name(v) => write!(f, "[name={v}]"),
        }
    }
}

/// Timing applied to every lookup a driver performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Upper bound for any element or frame lookup
    pub implicit_wait: Duration,
    /// Sleep between lookup attempts
    pub poll_interval: Duration,
    /// Delay after the login form is submitted
    pub settle: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            implicit_wait: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            settle: Duration::from_secs(2),
        }
    }
}

/// A live handle onto one browser (or browser double).
///
/// Every lookup is bounded by the [`WaitPolicy`] the driver was launched
/// with; operations act on the currently entered frame only.
#[async_trait]
pub trait UiDriver: Send {
    /// Navigates the top-level document to `url`
    async fn load(&mut self, url: &str) -> Result<(), DriverError>;

    /// Returns to the top-level document
    async fn reset_context(&mut self) -> Result<(), DriverError>;

    /// Enters the named frame of the top-level document
    async fn enter_context(&mut self, name: &str) -> Result<(), DriverError>;

    /// Waits until the element is present in the active document
    async fn wait_for(&mut self, locator: &Locator) -> Result<(), DriverError>;

    /// Whether a checkbox, radio button or option is selected
    async fn is_selected(&mut self, locator: &Locator) -> Result<bool, DriverError>;

    async fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// `value` of the selected member of a radio group, if any
    async fn selected_value(&mut self, group: &str) -> Result<Option<String>, DriverError>;

    async fn send_keys(&mut self, locator: &Locator, text: &str) -> Result<(), DriverError>;

    /// Presses Enter inside the element
    async fn submit(&mut self, locator: &Locator) -> Result<(), DriverError>;

    async fn click(&mut self, locator: &Locator) -> Result<(), DriverError>;

    /// Releases the browser
    async fn quit(&mut self) -> Result<(), DriverError>;
}

/// Starts drivers; one launch per audit
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    async fn launch(&self, policy: &WaitPolicy) -> Result<Box<dyn UiDriver>, DriverError>;
}
