//! Warden - security-posture auditor for home routers
//!
//! Logs into a router's web administration interface through a remote UI
//! driver, walks its menu frames, inspects a fixed sequence of security
//! controls and reports one severity-tagged finding per control.

pub mod audit;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod session;

pub use audit::AuditEngine;
pub use error::{Result, WardenError};
pub use models::{AuditConfig, AuditReport, Finding, Severity, Target};
