//! Warden - router security-posture auditor CLI

use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;

use warden::audit::{AuditEngine, DeviceProfile, Probe};
use warden::config;
use warden::models::{AuditConfig, AuditReport, Severity, Target};
use warden::report;

/// Warden - security-posture auditor for home router admin interfaces
#[derive(Parser)]
#[command(name = "warden", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit one or more routers
    Audit {
        /// Router address (IP, host name or URL); repeat or comma-separate for several
        #[arg(short, long, required = true, value_delimiter = ',')]
        target: Vec<String>,

        /// Administrator password
        #[arg(short, long, env = "WARDEN_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,

        /// Administrator user name (ignored by TP-Link)
        #[arg(short, long)]
        username: Option<String>,

        /// Device profile
        #[arg(long)]
        profile: Option<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Abort an audit after this many seconds
        #[arg(long)]
        deadline: Option<u64>,

        /// Devices audited at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Output format (text, json or jsonl)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file path for json/jsonl
        #[arg(short, long)]
        output: Option<String>,

        /// Exit with code 1 if findings at or above this severity are found (warning, danger)
        #[arg(long)]
        fail_on: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the checks of a device profile
    Checks {
        /// Device profile
        #[arg(long)]
        profile: Option<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print a report saved with --format json
    Report {
        /// Path to the JSON results file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "warden=debug" } else { "warden=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> warden::Result<AuditConfig> {
    if let Some(path) = path {
        return config::load_config(path);
    }
    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        config::load_config(default_path)
    } else {
        Ok(AuditConfig::default())
    }
}

fn print_banner() {
    let banner = r#"
    ╔═══════════════════════════════════════╗
    ║  WARDEN v0.1.0                        ║
    ║  Router security-posture audit        ║
    ╚═══════════════════════════════════════╝
    "#;
    println!("{}", banner.cyan());
}

fn tag(severity: Severity) -> ColoredString {
    let label = format!("{:<8}", severity.as_str().to_uppercase()).color(severity.color());
    if severity == Severity::Danger {
        label.bold()
    } else {
        label
    }
}

fn print_report(report: &AuditReport) {
    println!(
        "\n  {} {} ({}, {})",
        "Target:".bold(),
        report.target.green(),
        report.profile.cyan(),
        report.outcome
    );
    println!("  {}", "─".repeat(50));
    for finding in &report.findings {
        println!("  {} {}", tag(finding.severity), finding.message);
    }
}

fn print_summary(reports: &[AuditReport]) {
    println!("\n{}", "  Audit Summary".bold());
    println!("  {}", "─".repeat(35));

    let mut builder = Builder::default();
    builder.push_record(["Target", "Success", "Warning", "Danger", "Outcome"]);
    for report in reports {
        builder.push_record([
            report.target.clone(),
            report.count_by_severity(Severity::Success).to_string(),
            report.count_by_severity(Severity::Warning).to_string(),
            report.count_by_severity(Severity::Danger).to_string(),
            report.outcome.to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{table}");
}

fn print_checks(profile: &DeviceProfile) {
    println!(
        "  {} {}\n",
        format!("Profile {}:", profile.name).bold(),
        profile.description
    );
    for (index, check) in profile.checks.iter().enumerate() {
        let expectation = match &check.probe {
            Probe::Toggle { expected: true, .. } => "expect enabled",
            Probe::Toggle { expected: false, .. } => "expect disabled",
            Probe::SecurityMode { .. } => "expect WPA2/WPA3-Personal",
            Probe::ActionLabel { .. } => "expect disabled (button label)",
        };
        println!(
            "    {} {} {} [{}] {}",
            format!("{}.", index + 1).bold(),
            format!("{:18}", check.id).cyan().bold(),
            check.name,
            check.menu_path.join(" > "),
            expectation.dimmed()
        );
    }
    println!();
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Audit {
            target,
            password,
            username,
            profile,
            config: config_path,
            deadline,
            concurrency,
            headed,
            format,
            output,
            fail_on,
            verbose,
        } => {
            init_tracing(verbose);

            let fail_severity = match fail_on.as_deref() {
                Some(value) => match Severity::parse_threshold(value) {
                    Some(severity) => Some(severity),
                    None => {
                        eprintln!(
                            "  {} Invalid --fail-on value: '{}'. Use: warning, danger",
                            "Error:".red().bold(),
                            value
                        );
                        std::process::exit(2);
                    }
                },
                None => None,
            };

            let mut audit_config = load_config(config_path.as_deref())?;
            config::merge_cli_args(&mut audit_config, profile, deadline, concurrency, headed);
            config::validate(&audit_config)?;

            let engine = AuditEngine::from_config(&audit_config)?;
            let targets: Vec<Target> = target
                .iter()
                .map(|address| {
                    let target = Target::new(address.trim(), password.as_str());
                    match username {
                        Some(ref user) => target.with_username(user.as_str()),
                        None => target,
                    }
                })
                .collect();

            let text = format == "text";
            if text {
                print_banner();
                println!(
                    "  {} {}",
                    "Profile:".bold(),
                    engine.profile().name.cyan()
                );
                println!("  {} {}", "Targets:".bold(), target.join(", ").green());
            }

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("  {spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(format!("Auditing {} device(s)...", targets.len()));
            spinner.enable_steady_tick(Duration::from_millis(120));

            let reports = engine
                .audit_many(targets, audit_config.concurrency)
                .await;
            spinner.finish_and_clear();

            match format.as_str() {
                "json" | "jsonl" => {
                    let output_file = output.unwrap_or_else(|| format!("warden_report.{format}"));
                    let output_path = Path::new(&output_file);
                    if format == "json" {
                        report::json::export(&reports, output_path)?;
                    } else {
                        report::jsonl::export(&reports, output_path)?;
                    }
                    println!("  {} {}", "Report saved to:".bold(), output_file.green());
                }
                _ => {
                    for report in &reports {
                        print_report(report);
                    }
                    print_summary(&reports);
                }
            }

            if let Some(threshold) = fail_severity {
                if reports.iter().any(|r| r.has_at_least(threshold)) {
                    println!(
                        "\n  {} Findings at or above {} severity detected.",
                        "FAIL:".red().bold(),
                        threshold.as_str().to_uppercase().red()
                    );
                    std::process::exit(1);
                }
            }
        }

        Commands::Checks {
            profile,
            config: config_path,
        } => {
            print_banner();
            let mut audit_config = load_config(config_path.as_deref())?;
            config::merge_cli_args(&mut audit_config, profile, None, None, false);
            let profile = DeviceProfile::by_name(&audit_config.profile, &audit_config.labels)?;
            print_checks(&profile);
        }

        Commands::Report { input } => {
            init_tracing(false);
            print_banner();

            let reports = report::json::load(&input)?;
            for report in &reports {
                print_report(report);
            }
            print_summary(&reports);
        }
    }

    Ok(())
}
