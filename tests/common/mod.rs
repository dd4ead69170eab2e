//! Common test utilities: an in-memory TP-Link interface

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use warden::audit::{AuditEngine, AuditSettings, DeviceProfile};
use warden::models::LabelSemantics;
use warden::session::{DriverError, DriverLauncher, Locator, UiDriver, WaitPolicy};

pub const MENU_FRAME: &str = "bottomLeftFrame";
pub const MAIN_FRAME: &str = "mainFrame";
pub const PASSWORD: &str = "s3cret";

/// Launch and quit calls seen by a launcher
#[derive(Clone, Default)]
pub struct Counters {
    pub launches: Arc<AtomicUsize>,
    pub quits: Arc<AtomicUsize>,
}

impl Counters {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn quits(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeControl {
    pub selected: bool,
    pub value: Option<String>,
}

/// Content rendered in the main frame after a menu click
#[derive(Clone, Debug, Default)]
pub struct FakePage {
    pub controls: HashMap<String, FakeControl>,
    pub groups: HashMap<String, Vec<(String, bool)>>,
}

/// Deterministic model of a router's frameset interface
#[derive(Clone, Debug)]
pub struct FakeDevice {
    pub password: String,
    pub menu: Vec<String>,
    pub pages: HashMap<String, FakePage>,
    pub frames: HashSet<String>,
    /// Elements that never show up
    pub broken: HashSet<String>,
    /// Elements whose lookup never returns
    pub hanging: HashSet<String>,
    pub fail_launch: bool,
    pub fail_quit: bool,
}

impl FakeDevice {
    /// A router with every control in its secure state
    pub fn secure() -> Self {
        Self {
            password: PASSWORD.to_string(),
            menu: Vec::new(),
            pages: HashMap::new(),
            frames: [MENU_FRAME, MAIN_FRAME].iter().map(|f| f.to_string()).collect(),
            broken: HashSet::new(),
            hanging: HashSet::new(),
            fail_launch: false,
            fail_quit: false,
        }
        .with_toggle("menu_wl", "ssidBroadcast", false)
        .with_security_mode("3")
        .with_label("menu_wlqss", "qssSwitch", "Enable WPS")
        .with_toggle("menu_security", "enable_spi", true)
        .with_toggle("menu_ddos", "wanPingFilter", true)
        .with_toggle("menu_wlacl", "acl_en", true)
        .with_toggle("menu_wlguest", "guestDis", true)
    }

    /// A router with every control in its insecure state
    pub fn insecure() -> Self {
        Self::secure()
            .with_toggle("menu_wl", "ssidBroadcast", true)
            .with_security_mode("0")
            .with_label("menu_wlqss", "qssSwitch", "Disable WPS")
            .with_toggle("menu_security", "enable_spi", false)
            .with_toggle("menu_ddos", "wanPingFilter", false)
            .with_toggle("menu_wlacl", "acl_en", false)
            .with_toggle("menu_wlguest", "guestDis", false)
    }

    fn page(&mut self, menu: &str) -> &mut FakePage {
        if !self.menu.iter().any(|m| m == menu) {
            self.menu.push(menu.to_string());
        }
        self.pages.entry(menu.to_string()).or_default()
    }

    pub fn with_toggle(mut self, menu: &str, control: &str, selected: bool) -> Self {
        self.page(menu).controls.insert(
            control.to_string(),
            FakeControl {
                selected,
                value: None,
            },
        );
        self
    }

    pub fn with_label(mut self, menu: &str, control: &str, label: &str) -> Self {
        self.page(menu).controls.insert(
            control.to_string(),
            FakeControl {
                selected: false,
                value: Some(label.to_string()),
            },
        );
        self
    }

    pub fn with_security_mode(mut self, value: &str) -> Self {
        let group = ["0", "1", "2", "3"]
            .iter()
            .map(|v| (v.to_string(), *v == value))
            .collect();
        self.page("menu_wlsec")
            .groups
            .insert("secType".to_string(), group);
        self
    }

    pub fn with_broken(mut self, id: &str) -> Self {
        self.broken.insert(id.to_string());
        self
    }

    pub fn with_hanging(mut self, id: &str) -> Self {
        self.hanging.insert(id.to_string());
        self
    }

    pub fn without_frame(mut self, frame: &str) -> Self {
        self.frames.remove(frame);
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn failing_quit(mut self) -> Self {
        self.fail_quit = true;
        self
    }
}

pub struct FakeLauncher {
    pub device: FakeDevice,
    pub counters: Counters,
}

#[async_trait]
impl DriverLauncher for FakeLauncher {
    async fn launch(&self, _policy: &WaitPolicy) -> Result<Box<dyn UiDriver>, DriverError> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        if self.device.fail_launch {
            return Err(DriverError::Launch("chromium not found".to_string()));
        }
        Ok(Box::new(FakeDriver {
            device: self.device.clone(),
            counters: self.counters.clone(),
            loaded: false,
            logged_in: false,
            typed: String::new(),
            context: None,
            current_page: None,
        }))
    }
}

pub struct FakeDriver {
    device: FakeDevice,
    counters: Counters,
    loaded: bool,
    logged_in: bool,
    typed: String,
    context: Option<String>,
    current_page: Option<String>,
}

impl FakeDriver {
    fn missing(locator: &Locator) -> DriverError {
        DriverError::Timeout {
            what: locator.to_string(),
            waited_ms: 0,
        }
    }

    fn page(&self) -> Option<&FakePage> {
        self.current_page
            .as_ref()
            .and_then(|menu| self.device.pages.get(menu))
    }

    fn control(&self, locator: &Locator) -> Option<&FakeControl> {
        if self.device.broken.contains(locator.value()) {
            return None;
        }
        match (self.context.as_deref(), locator) {
            (Some(MAIN_FRAME), Locator::Id(id)) => self.page()?.controls.get(id),
            _ => None,
        }
    }

    fn present(&self, locator: &Locator) -> bool {
        if self.device.broken.contains(locator.value()) {
            return false;
        }
        match (self.context.as_deref(), locator) {
            (None, Locator::Id(id)) => self.loaded && !self.logged_in && id == "pcPassword",
            (Some(MENU_FRAME), Locator::Id(id)) => self.device.menu.iter().any(|m| m == id),
            (Some(MAIN_FRAME), Locator::Name(name)) => self
                .page()
                .map(|p| p.groups.contains_key(name))
                .unwrap_or(false),
            (Some(MAIN_FRAME), Locator::Id(_)) => self.control(locator).is_some(),
            _ => false,
        }
    }
}

#[async_trait]
impl UiDriver for FakeDriver {
    async fn load(&mut self, _url: &str) -> Result<(), DriverError> {
        self.loaded = true;
        self.logged_in = false;
        self.context = None;
        Ok(())
    }

    async fn reset_context(&mut self) -> Result<(), DriverError> {
        self.context = None;
        Ok(())
    }

    async fn enter_context(&mut self, name: &str) -> Result<(), DriverError> {
        if self.logged_in && self.device.frames.contains(name) {
            self.context = Some(name.to_string());
            Ok(())
        } else {
            Err(DriverError::Timeout {
                what: format!("frame '{name}'"),
                waited_ms: 0,
            })
        }
    }

    async fn wait_for(&mut self, locator: &Locator) -> Result<(), DriverError> {
        if self.device.hanging.contains(locator.value()) {
            tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        }
        if self.present(locator) {
            Ok(())
        } else {
            Err(Self::missing(locator))
        }
    }

    async fn is_selected(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        self.control(locator)
            .map(|c| c.selected)
            .ok_or_else(|| Self::missing(locator))
    }

    async fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let control = self.control(locator).ok_or_else(|| Self::missing(locator))?;
        Ok(if name == "value" {
            control.value.clone()
        } else {
            None
        })
    }

    async fn selected_value(&mut self, group: &str) -> Result<Option<String>, DriverError> {
        Ok(self
            .page()
            .and_then(|p| p.groups.get(group))
            .and_then(|members| members.iter().find(|(_, selected)| *selected))
            .map(|(value, _)| value.clone()))
    }

    async fn send_keys(&mut self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        if !self.present(locator) {
            return Err(Self::missing(locator));
        }
        self.typed.push_str(text);
        Ok(())
    }

    async fn submit(&mut self, locator: &Locator) -> Result<(), DriverError> {
        if !self.present(locator) {
            return Err(Self::missing(locator));
        }
        self.logged_in = self.typed == self.device.password;
        self.typed.clear();
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), DriverError> {
        if !self.present(locator) {
            return Err(Self::missing(locator));
        }
        if self.context.as_deref() == Some(MENU_FRAME) {
            self.current_page = Some(locator.value().to_string());
        }
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        self.counters.quits.fetch_add(1, Ordering::SeqCst);
        if self.device.fail_quit {
            Err(DriverError::Protocol("browser already gone".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Settings without real waiting
pub fn instant_settings() -> AuditSettings {
    AuditSettings {
        wait: WaitPolicy {
            implicit_wait: Duration::from_millis(10),
            poll_interval: Duration::from_millis(1),
            settle: Duration::ZERO,
        },
        deadline: None,
    }
}

/// Engine over the TP-Link profile and a fake device
pub fn engine(device: FakeDevice) -> (AuditEngine, Counters) {
    engine_with(device, LabelSemantics::default(), instant_settings())
}

pub fn engine_with(
    device: FakeDevice,
    labels: LabelSemantics,
    settings: AuditSettings,
) -> (AuditEngine, Counters) {
    let counters = Counters::default();
    let launcher = FakeLauncher {
        device,
        counters: counters.clone(),
    };
    let engine = AuditEngine::new(
        Arc::new(launcher),
        DeviceProfile::tplink(labels),
        settings,
    );
    (engine, counters)
}
