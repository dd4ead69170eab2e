//! UI session over a device's administrative interface
//!
//! A session wraps one launched driver for one target. It maps raw driver
//! failures onto the audit error taxonomy: launch problems become
//! connection errors, login problems become auth errors, missing frames
//! become navigation errors and missing controls become lookup errors.
//! Every driver call is bounded by the launch [`WaitPolicy`], so a driver
//! that never answers still yields a timeout.

pub mod browser;
pub mod driver;

pub use browser::ChromeLauncher;
pub use driver::{DriverError, DriverLauncher, Locator, UiDriver, WaitPolicy};

use crate::error::{Result, WardenError};
use crate::models::Target;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// What to do with a control once it has been found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Compare the control's selected state with the expected one
    Expect(bool),
    /// The control is a menu trigger; click it
    Navigate,
}

/// Result of [`UiSession::read_or_toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Whether the observed state matched the expectation
    Matched(bool),
    Navigated,
}

/// Login form details for a device family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    /// Id of the password input
    pub password_control: String,
    /// Frame that must be reachable once the login went through
    pub ready_context: String,
}

/// An open session bound to exactly one target
pub struct UiSession {
    driver: Box<dyn UiDriver>,
    target: Target,
    policy: WaitPolicy,
    active_context: Option<String>,
}

impl UiSession {
    /// Launches a driver for `target`. Never retried.
    pub async fn open(
        launcher: &dyn DriverLauncher,
        target: &Target,
        policy: &WaitPolicy,
    ) -> Result<Self> {
        info!("Opening session for {}", target.address);
        let driver = launcher
            .launch(policy)
            .await
            .map_err(|e| WardenError::Connection(e.to_string()))?;

        Ok(Self {
            driver,
            target: target.clone(),
            policy: *policy,
            active_context: None,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Frame currently focused, `None` for the top-level document
    pub fn active_context(&self) -> Option<&str> {
        self.active_context.as_deref()
    }

    /// Submits the administrator password once and waits for the interface
    pub async fn authenticate(&mut self, form: &LoginForm) -> Result<()> {
        let url = self.target.base_url()?;
        info!("Logging in to {url}");

        let limit = self.bound();
        bounded(limit, &url, self.driver.load(url.as_str()))
            .await
            .map_err(|e| WardenError::Auth(format!("could not load {url}: {e}")))?;

        let field = Locator::id(&form.password_control);
        let password = self.target.credential.password.clone();
        let submitted = async {
            bounded(limit, &field, self.driver.wait_for(&field)).await?;
            bounded(limit, &field, self.driver.send_keys(&field, &password)).await?;
            bounded(limit, &field, self.driver.submit(&field)).await
        }
        .await;
        submitted.map_err(|e| WardenError::Auth(format!("login form unusable: {e}")))?;

        tokio::time::sleep(self.policy.settle).await;

        // The menu frame only exists behind a successful login.
        self.focus(&form.ready_context).await.map_err(|e| {
            WardenError::Auth(format!("interface did not open after login: {e}"))
        })?;
        self.reset().await;

        info!("Authenticated to {}", self.target.address);
        Ok(())
    }

    /// Upper bound for a single driver call
    fn bound(&self) -> Duration {
        self.policy.implicit_wait + self.policy.poll_interval
    }

    async fn reset(&mut self) {
        let limit = self.bound();
        let reset = bounded(limit, "top-level document", self.driver.reset_context()).await;
        if let Err(e) = reset {
            debug!("Reset to top-level document failed: {e}");
        }
        self.active_context = None;
    }

    /// Switches to a named frame, starting from the top-level document
    pub async fn focus(&mut self, context: &str) -> Result<()> {
        let navigation = |source: DriverError| WardenError::Navigation {
            context: context.to_string(),
            source,
        };

        let limit = self.bound();
        let what = format!("frame '{context}'");
        self.active_context = None;
        bounded(limit, &what, self.driver.reset_context())
            .await
            .map_err(navigation)?;
        bounded(limit, &what, self.driver.enter_context(context))
            .await
            .map_err(navigation)?;
        self.active_context = Some(context.to_string());
        debug!("Focused frame '{context}'");
        Ok(())
    }

    /// Finds a control in the active frame and either reads it or clicks it
    pub async fn read_or_toggle(
        &mut self,
        control: &str,
        interaction: Interaction,
    ) -> Result<Observation> {
        let locator = Locator::id(control);
        let lookup = |source: DriverError| WardenError::Lookup {
            control: control.to_string(),
            source,
        };

        let limit = self.bound();
        bounded(limit, &locator, self.driver.wait_for(&locator))
            .await
            .map_err(lookup)?;
        match interaction {
            Interaction::Expect(expected) => {
                let selected = bounded(limit, &locator, self.driver.is_selected(&locator))
                    .await
                    .map_err(lookup)?;
                debug!("Control '{control}' selected={selected} expected={expected}");
                Ok(Observation::Matched(selected == expected))
            }
            Interaction::Navigate => {
                bounded(limit, &locator, self.driver.click(&locator))
                    .await
                    .map_err(lookup)?;
                debug!("Clicked menu item '{control}'");
                Ok(Observation::Navigated)
            }
        }
    }

    /// `value` of the selected member of a radio group in the active frame
    pub async fn selected_value(&mut self, group: &str) -> Result<Option<String>> {
        let locator = Locator::name(group);
        let lookup = |source: DriverError| WardenError::Lookup {
            control: group.to_string(),
            source,
        };

        let limit = self.bound();
        bounded(limit, &locator, self.driver.wait_for(&locator))
            .await
            .map_err(lookup)?;
        bounded(limit, &locator, self.driver.selected_value(group))
            .await
            .map_err(lookup)
    }

    /// Text shown on a button in the active frame
    pub async fn label(&mut self, control: &str) -> Result<String> {
        let locator = Locator::id(control);
        let lookup = |source: DriverError| WardenError::Lookup {
            control: control.to_string(),
            source,
        };

        let limit = self.bound();
        bounded(limit, &locator, self.driver.wait_for(&locator))
            .await
            .map_err(lookup)?;
        let value = bounded(limit, &locator, self.driver.attribute(&locator, "value"))
            .await
            .map_err(lookup)?;
        Ok(value.unwrap_or_default())
    }

    /// Releases the driver. Failures are logged and swallowed.
    pub async fn close(mut self) {
        let limit = self.bound();
        match bounded(limit, "browser shutdown", self.driver.quit()).await {
            Ok(()) => info!("Session for {} closed", self.target.address),
            Err(e) => warn!("Closing session for {} failed: {e}", self.target.address),
        }
    }
}

/// Runs one driver call, turning an overrun of `limit` into a timeout
async fn bounded<T>(
    limit: Duration,
    what: impl std::fmt::Display,
    call: impl Future<Output = std::result::Result<T, DriverError>>,
) -> std::result::Result<T, DriverError> {
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DriverError::Timeout {
            what: what.to_string(),
            waited_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
