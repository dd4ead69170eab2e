//! Audit engine: runs a device profile's checks over one UI session

pub mod checks;
pub mod profile;

pub use checks::{Check, CheckOutcome, Layout, Probe, Reading};
pub use profile::{DeviceProfile, BUILTIN_PROFILES};

use crate::error::{Result, WardenError};
use crate::models::{AuditConfig, AuditOutcome, AuditReport, Finding, Target};
use crate::session::{ChromeLauncher, DriverLauncher, UiSession, WaitPolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Where an audit is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditState {
    Init,
    Authenticated,
    /// Running the check at this 1-based position
    Checking(usize),
    Done,
    Aborted,
}

/// Timing knobs for an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuditSettings {
    pub wait: WaitPolicy,
    /// Upper bound for login plus all checks
    pub deadline: Option<Duration>,
}

impl AuditSettings {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            wait: WaitPolicy {
                implicit_wait: Duration::from_secs(config.implicit_wait_secs),
                poll_interval: Duration::from_millis(config.poll_interval_ms),
                settle: Duration::from_millis(config.settle_ms),
            },
            deadline: config.deadline_secs.map(Duration::from_secs),
        }
    }
}

/// Runs the fixed check sequence of a device profile against targets.
///
/// Each audit opens its own session and closes it exactly once, however
/// the audit ends. Engines are cheap to clone and share nothing mutable.
#[derive(Clone)]
pub struct AuditEngine {
    launcher: Arc<dyn DriverLauncher>,
    profile: Arc<DeviceProfile>,
    settings: AuditSettings,
}

impl AuditEngine {
    pub fn new(
        launcher: Arc<dyn DriverLauncher>,
        profile: DeviceProfile,
        settings: AuditSettings,
    ) -> Self {
        Self {
            launcher,
            profile: Arc::new(profile),
            settings,
        }
    }

    /// Builds a Chromium-backed engine from configuration
    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        let profile = DeviceProfile::by_name(&config.profile, &config.labels)?;
        let launcher = ChromeLauncher::new(config.headless, config.chrome_executable.clone());
        Ok(Self::new(
            Arc::new(launcher),
            profile,
            AuditSettings::from_config(config),
        ))
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Audits one device and returns its findings in check order
    pub async fn run_audit(&self, address: &str, password: &str) -> Vec<Finding> {
        self.audit(&Target::new(address, password)).await.findings
    }

    /// Audits one device
    pub async fn audit(&self, target: &Target) -> AuditReport {
        let mut report = AuditReport::new(&target.address, &self.profile.name);
        let mut state = AuditState::Init;
        info!(
            "Auditing {} with profile '{}'",
            target.address, self.profile.name
        );

        let mut session =
            match UiSession::open(self.launcher.as_ref(), target, &self.settings.wait).await {
                Ok(session) => session,
                Err(e) => {
                    error!("Audit of {} aborted: {e}", target.address);
                    report.findings.push(abort_finding(&e));
                    transition(&mut state, AuditState::Aborted);
                    report.finish(AuditOutcome::Aborted);
                    return report;
                }
            };

        let outcome = match self.settings.deadline {
            Some(limit) => {
                let run = self.drive(&mut session, &mut state, &mut report.findings);
                let timed = tokio::time::timeout(limit, run).await;
                match timed {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        let e = WardenError::DeadlineExceeded(limit.as_secs());
                        error!("Audit of {} stopped in {state:?}: {e}", target.address);
                        report.findings.push(abort_finding(&e));
                        transition(&mut state, AuditState::Aborted);
                        AuditOutcome::Aborted
                    }
                }
            }
            None => {
                self.drive(&mut session, &mut state, &mut report.findings)
                    .await
            }
        };

        session.close().await;
        report.finish(outcome);
        info!(
            "Audit of {} {}: {} findings",
            target.address,
            outcome,
            report.findings.len()
        );
        report
    }

    /// Logs in, then folds every check into one finding each
    async fn drive(
        &self,
        session: &mut UiSession,
        state: &mut AuditState,
        findings: &mut Vec<Finding>,
    ) -> AuditOutcome {
        if let Err(e) = session.authenticate(&self.profile.login).await {
            error!("Audit of {} aborted: {e}", session.target().address);
            findings.push(abort_finding(&e));
            transition(state, AuditState::Aborted);
            return AuditOutcome::Aborted;
        }
        transition(state, AuditState::Authenticated);

        for (index, check) in self.profile.checks.iter().enumerate() {
            transition(state, AuditState::Checking(index + 1));
            let outcome: CheckOutcome = check.run(session, &self.profile.layout).await;
            let finding = match outcome {
                Ok(finding) => finding,
                Err(e) => {
                    warn!("Check '{}' could not run: {e}", check.id);
                    Finding::warning(format!("Could not verify {}: {e}", check.name))
                }
            };
            debug!("Check '{}' -> {}", check.id, finding.severity);
            findings.push(finding);
        }

        transition(state, AuditState::Done);
        AuditOutcome::Completed
    }

    /// Audits several devices, each over its own session.
    ///
    /// At most `concurrency` audits run at once; reports come back in the
    /// order of `targets`.
    pub async fn audit_many(&self, targets: Vec<Target>, concurrency: usize) -> Vec<AuditReport> {
        let limit = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut set = JoinSet::new();

        for (index, target) in targets.into_iter().enumerate() {
            let engine = self.clone();
            let limit = Arc::clone(&limit);
            set.spawn(async move {
                let _permit = limit.acquire_owned().await;
                (index, engine.audit(&target).await)
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(indexed) => reports.push(indexed),
                Err(e) => error!("Audit task panicked: {e}"),
            }
        }

        reports.sort_by_key(|(index, _)| *index);
        reports.into_iter().map(|(_, report)| report).collect()
    }
}

fn transition(state: &mut AuditState, next: AuditState) {
    debug!("Audit state {state:?} -> {next:?}");
    *state = next;
}

fn abort_finding(e: &WardenError) -> Finding {
    Finding::danger(format!("Audit aborted: {e}"))
}
