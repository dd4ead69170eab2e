//! Configuration management for Warden

use crate::error::{Result, WardenError};
use crate::models::AuditConfig;
use serde::Deserialize;
use std::path::Path;

/// File-based configuration structure matching config/default.toml
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    session: Option<SessionSection>,
    audit: Option<AuditSection>,
    labels: Option<LabelsSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionSection {
    implicit_wait_secs: Option<u64>,
    poll_interval_ms: Option<u64>,
    settle_ms: Option<u64>,
    headless: Option<bool>,
    chrome_executable: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AuditSection {
    profile: Option<String>,
    deadline_secs: Option<u64>,
    concurrency: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LabelsSection {
    inverted: Option<bool>,
    enabled_word: Option<String>,
    disabled_word: Option<String>,
}

/// Loads configuration from a TOML file and merges with defaults
pub fn load_config(path: &Path) -> Result<AuditConfig> {
    let content = std::fs::read_to_string(path).map_err(WardenError::IoError)?;
    parse_config(&content)
}

/// Parses TOML configuration text on top of the defaults
pub fn parse_config(content: &str) -> Result<AuditConfig> {
    let file_config: FileConfig = toml::from_str(content)?;
    let mut config = AuditConfig::default();

    if let Some(session) = file_config.session {
        if let Some(wait) = session.implicit_wait_secs {
            config.implicit_wait_secs = wait;
        }
        if let Some(poll) = session.poll_interval_ms {
            config.poll_interval_ms = poll;
        }
        if let Some(settle) = session.settle_ms {
            config.settle_ms = settle;
        }
        if let Some(headless) = session.headless {
            config.headless = headless;
        }
        if session.chrome_executable.is_some() {
            config.chrome_executable = session.chrome_executable;
        }
    }

    if let Some(audit) = file_config.audit {
        if let Some(profile) = audit.profile {
            config.profile = profile;
        }
        if audit.deadline_secs.is_some() {
            config.deadline_secs = audit.deadline_secs;
        }
        if let Some(concurrency) = audit.concurrency {
            config.concurrency = concurrency;
        }
    }

    if let Some(labels) = file_config.labels {
        if let Some(inverted) = labels.inverted {
            config.labels.inverted = inverted;
        }
        if let Some(word) = labels.enabled_word {
            config.labels.enabled_word = word;
        }
        if let Some(word) = labels.disabled_word {
            config.labels.disabled_word = word;
        }
    }

    validate(&config)?;
    Ok(config)
}

/// Rejects values that would make every lookup fail or hang
pub fn validate(config: &AuditConfig) -> Result<()> {
    if config.implicit_wait_secs == 0 {
        return Err(WardenError::ConfigError(
            "implicit_wait_secs must be at least 1".to_string(),
        ));
    }
    if config.poll_interval_ms == 0 {
        return Err(WardenError::ConfigError(
            "poll_interval_ms must be at least 1".to_string(),
        ));
    }
    if config.concurrency == 0 {
        return Err(WardenError::ConfigError(
            "concurrency must be at least 1".to_string(),
        ));
    }
    if config.labels.enabled_word.trim().is_empty() || config.labels.disabled_word.trim().is_empty()
    {
        return Err(WardenError::ConfigError(
            "label words must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Merges CLI arguments into an existing AuditConfig
pub fn merge_cli_args(
    config: &mut AuditConfig,
    profile: Option<String>,
    deadline_secs: Option<u64>,
    concurrency: Option<usize>,
    headed: bool,
) {
    if let Some(p) = profile {
        config.profile = p;
    }
    if let Some(d) = deadline_secs {
        config.deadline_secs = Some(d);
    }
    if let Some(c) = concurrency {
        config.concurrency = c;
    }
    if headed {
        config.headless = false;
    }
}
