//! Chromium-backed driver for administrative interfaces
//!
//! Drives headless Chromium over the DevTools protocol. Router interfaces
//! are framesets served from one origin, so frame switching is done by
//! addressing `window.top.frames[name].document` from the page's main
//! world. Only available with the `browser` feature.

use super::driver::{DriverError, DriverLauncher, UiDriver, WaitPolicy};
use async_trait::async_trait;

#[cfg(feature = "browser")]
use super::driver::Locator;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;
#[cfg(feature = "browser")]
use tracing::{debug, info};

/// Launch options for Chromium
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    /// Show the browser window
    pub headed: bool,
    /// Explicit Chromium binary, otherwise auto-detected
    pub executable: Option<String>,
}

impl ChromeLauncher {
    pub fn new(headless: bool, executable: Option<String>) -> Self {
        Self {
            headed: !headless,
            executable,
        }
    }
}

/// Live Chromium instance bound to one tab
#[cfg(feature = "browser")]
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    policy: WaitPolicy,
    context: Option<String>,
}

#[cfg(feature = "browser")]
#[async_trait]
impl DriverLauncher for ChromeLauncher {
    async fn launch(&self, policy: &WaitPolicy) -> Result<Box<dyn UiDriver>, DriverError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .request_timeout(policy.implicit_wait);
        if self.headed {
            builder = builder.with_head();
        }
        if let Some(ref path) = self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| DriverError::Launch(format!("browser config error: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(DriverError::Launch(e.to_string()));
            }
        };

        info!("Chromium started");
        Ok(Box::new(ChromeDriver {
            browser,
            page,
            handler,
            policy: *policy,
            context: None,
        }))
    }
}

#[cfg(feature = "browser")]
impl ChromeDriver {
    /// JS expression for the document of the active frame
    fn document(&self) -> String {
        match self.context {
            None => "window.top.document".to_string(),
            Some(ref name) => format!("window.top.frames[{}].document", js_string(name)),
        }
    }

    fn element(&self, locator: &Locator) -> String {
        match locator {
            Locator::Id(id) => format!("{}.getElementById({})", self.document(), js_string(id)),
            Locator::Name(name) => format!(
                "{}.getElementsByName({})[0]",
                self.document(),
                js_string(name)
            ),
        }
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T, DriverError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| DriverError::Protocol(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| DriverError::Protocol(e.to_string()))
    }

    /// Polls a boolean probe until it holds or the implicit wait runs out
    async fn poll(&self, probe: String, what: String) -> Result<(), DriverError> {
        let deadline = tokio::time::Instant::now() + self.policy.implicit_wait;
        loop {
            // Frames are torn down while menus navigate; treat errors as "not yet".
            if let Ok(true) = self.eval::<bool>(probe.clone()).await {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    what,
                    waited_ms: self.policy.implicit_wait.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }

    /// Runs a statement against an element, failing if it has gone away
    async fn with_element(&self, locator: &Locator, body: &str) -> Result<(), DriverError> {
        let script = format!(
            "(() => {{ const el = {}; if (!el) return false; {} return true; }})()",
            self.element(locator),
            body
        );
        match self.eval::<bool>(script).await? {
            true => Ok(()),
            false => Err(DriverError::Timeout {
                what: locator.to_string(),
                waited_ms: 0,
            }),
        }
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl UiDriver for ChromeDriver {
    async fn load(&mut self, url: &str) -> Result<(), DriverError> {
        self.context = None;
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Protocol(e.to_string()))?;
        debug!("Loaded {url}");
        Ok(())
    }

    async fn reset_context(&mut self) -> Result<(), DriverError> {
        self.context = None;
        Ok(())
    }

    async fn enter_context(&mut self, name: &str) -> Result<(), DriverError> {
        let probe = format!(
            "(() => {{ const f = window.top.frames[{}]; \
             return !!(f && f.document && f.document.readyState !== 'loading'); }})()",
            js_string(name)
        );
        self.poll(probe, format!("frame '{name}'")).await?;
        self.context = Some(name.to_string());
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator) -> Result<(), DriverError> {
        let probe = format!(
            "(() => {{ try {{ return !!{}; }} catch (e) {{ return false; }} }})()",
            self.element(locator)
        );
        self.poll(probe, locator.to_string()).await
    }

    async fn is_selected(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        let script = format!(
            "(() => {{ const el = {}; if (!el) return null; \
             return el.checked === true || el.selected === true; }})()",
            self.element(locator)
        );
        self.eval::<Option<bool>>(script)
            .await?
            .ok_or_else(|| DriverError::Timeout {
                what: locator.to_string(),
                waited_ms: 0,
            })
    }

    async fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        // `value` is read as a property so script-updated buttons report their live text.
        let script = format!(
            "(() => {{ const el = {el}; if (!el) return null; \
             const v = {n} === 'value' ? el.value : el.getAttribute({n}); \
             return v === undefined || v === null ? null : String(v); }})()",
            el = self.element(locator),
            n = js_string(name)
        );
        self.eval::<Option<String>>(script).await
    }

    async fn selected_value(&mut self, group: &str) -> Result<Option<String>, DriverError> {
        let script = format!(
            "(() => {{ const r = Array.from({}.getElementsByName({})).find(e => e.checked); \
             return r ? String(r.value) : null; }})()",
            self.document(),
            js_string(group)
        );
        self.eval::<Option<String>>(script).await
    }

    async fn send_keys(&mut self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        if self.context.is_none() {
            if let Locator::Id(id) = locator {
                let element = self
                    .page
                    .find_element(format!("#{id}"))
                    .await
                    .map_err(|e| DriverError::Protocol(e.to_string()))?;
                element
                    .click()
                    .await
                    .map_err(|e| DriverError::Protocol(e.to_string()))?;
                element
                    .type_str(text)
                    .await
                    .map_err(|e| DriverError::Protocol(e.to_string()))?;
                return Ok(());
            }
        }
        let body = format!(
            "el.focus(); el.value = {}; el.dispatchEvent(new Event('input', {{ bubbles: true }}));",
            js_string(text)
        );
        self.with_element(locator, &body).await
    }

    async fn submit(&mut self, locator: &Locator) -> Result<(), DriverError> {
        if self.context.is_none() {
            if let Locator::Id(id) = locator {
                let element = self
                    .page
                    .find_element(format!("#{id}"))
                    .await
                    .map_err(|e| DriverError::Protocol(e.to_string()))?;
                element
                    .press_key("Enter")
                    .await
                    .map_err(|e| DriverError::Protocol(e.to_string()))?;
                return Ok(());
            }
        }
        let body = "for (const t of ['keydown', 'keypress', 'keyup']) { \
                    el.dispatchEvent(new KeyboardEvent(t, \
                    { key: 'Enter', keyCode: 13, bubbles: true })); }";
        self.with_element(locator, body).await
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), DriverError> {
        self.with_element(locator, "el.click();").await
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        let closed = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler.abort();
        closed
            .map(|_| ())
            .map_err(|e| DriverError::Protocol(e.to_string()))
    }
}

#[cfg(feature = "browser")]
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Stub implementation when browser feature is not enabled
#[cfg(not(feature = "browser"))]
#[async_trait]
impl DriverLauncher for ChromeLauncher {
    async fn launch(&self, _policy: &WaitPolicy) -> Result<Box<dyn UiDriver>, DriverError> {
        Err(DriverError::Unsupported)
    }
}
