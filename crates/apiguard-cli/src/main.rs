//! apiguard - binary API-compatibility gate
//!
//! ## Commands
//!
//! - `check`: verify diff-engine output against acceptance files
//! - `accept`: record current unresolved incompatibilities in an acceptance file
//! - `validate`: load an acceptance file and report its entry count

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};

use apiguard_core::config::DEFAULT_REPORT_DIR;
use apiguard_core::{
    run_check, validate_check_name, write_report_json, write_report_md, AcceptanceFile,
    AcceptedChangeRegistry, ChangeKind, CheckOptions, CheckReport, VerificationConfig,
    DEFAULT_CONFIG_FILE,
};

const DEFAULT_CHECK_NAME: &str = "api";

#[derive(Parser)]
#[command(name = "apiguard")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Binary API-compatibility gate with reviewed acceptances", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check diff-engine output against acceptance files
    Check {
        /// Verification config (default: apiguard.toml)
        #[arg(short, long, conflicts_with = "diff")]
        config: Option<PathBuf>,

        /// Only run the named check from the config
        #[arg(long, conflicts_with = "diff")]
        only: Option<String>,

        /// Diff-engine output for a single ad-hoc check
        #[arg(long, requires = "accepted")]
        diff: Option<PathBuf>,

        /// Acceptance file for the ad-hoc check
        #[arg(long, requires = "diff")]
        accepted: Option<PathBuf>,

        /// Name of the ad-hoc check (default: api)
        #[arg(long, requires = "diff", value_parser = parse_check_name)]
        name: Option<String>,

        /// Extra change kinds to ignore in the ad-hoc check
        #[arg(long = "ignore", value_name = "CHANGE", requires = "diff")]
        ignore: Vec<String>,

        /// Report output directory (overrides config)
        #[arg(long, env = "APIGUARD_REPORT_DIR")]
        report_dir: Option<PathBuf>,
    },

    /// Add every unresolved incompatibility to an acceptance file
    Accept {
        /// Diff-engine output
        #[arg(long)]
        diff: PathBuf,

        /// Acceptance file to update (created if missing)
        #[arg(long)]
        accepted: PathBuf,

        /// Justification the new entries are filed under
        #[arg(short, long)]
        justification: String,

        /// Extra change kinds to ignore
        #[arg(long = "ignore", value_name = "CHANGE")]
        ignore: Vec<String>,
    },

    /// Validate an acceptance file
    Validate {
        /// Acceptance file to validate
        accepted: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    apiguard_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Check {
            config,
            only,
            diff,
            accepted,
            name,
            ignore,
            report_dir,
        } => match (diff, accepted) {
            (Some(diff), Some(accepted)) => {
                let name = name.unwrap_or_else(|| DEFAULT_CHECK_NAME.to_string());
                let mut options = CheckOptions::new(name, accepted);
                options.extra_ignored = parse_ignored(&ignore);
                let report_dir = report_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR));
                cmd_check(vec![(options, diff)], &report_dir)
            }
            _ => {
                let path = config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
                cmd_check_config(&path, only.as_deref(), report_dir)
            }
        },
        Commands::Accept {
            diff,
            accepted,
            justification,
            ignore,
        } => cmd_accept(&diff, &accepted, &justification, &ignore),
        Commands::Validate { accepted } => cmd_validate(&accepted),
    }
}

fn parse_check_name(name: &str) -> std::result::Result<String, String> {
    validate_check_name(name)
        .map(|()| name.to_string())
        .map_err(|e| e.to_string())
}

fn parse_ignored(names: &[String]) -> Vec<ChangeKind> {
    names.iter().map(|n| ChangeKind::from(n.trim())).collect()
}

fn cmd_check_config(path: &Path, only: Option<&str>, report_dir: Option<PathBuf>) -> Result<()> {
    let config = VerificationConfig::load(path)
        .with_context(|| format!("Failed to load config {:?}", path))?
        .with_env();

    let checks: Vec<(CheckOptions, PathBuf)> = match only {
        Some(name) => {
            let check = config
                .check(name)
                .with_context(|| format!("No check named '{}' in {:?}", name, path))?;
            vec![(check.options(), check.diff.clone())]
        }
        None => config
            .checks
            .iter()
            .map(|c| (c.options(), c.diff.clone()))
            .collect(),
    };

    let report_dir = report_dir.unwrap_or_else(|| config.report_dir());
    cmd_check(checks, &report_dir)
}

fn cmd_check(checks: Vec<(CheckOptions, PathBuf)>, report_dir: &Path) -> Result<()> {
    let mut failures = Vec::new();

    for (options, diff) in checks {
        let name = options.name.clone();
        let report = match run_check(options, &diff) {
            Ok(report) => report,
            Err(e) => {
                error!(check = %name, error = %e, "check could not run");
                failures.push(format!("Check '{}' could not run: {}", name, e));
                continue;
            }
        };

        print_report(&report);
        match write_reports(report_dir, &report) {
            Ok(md) => println!("  report: {}", md.display()),
            Err(e) => failures.push(format!("Check '{}' report not written: {:#}", name, e)),
        }

        if let Err(e) = report.into_result() {
            failures.push(e.to_string());
        }
    }

    if failures.is_empty() {
        info!("All API checks passed");
        Ok(())
    } else {
        anyhow::bail!("{}", failures.join("\n"))
    }
}

/// Write both report artifacts, returning the Markdown path.
fn write_reports(dir: &Path, report: &CheckReport) -> Result<PathBuf> {
    write_report_json(dir, report)?;
    write_report_md(dir, report)
}

fn print_report(report: &CheckReport) {
    let s = &report.summary;
    println!(
        "{}: {} ({} members, {} accepted, {} unresolved, {} stale)",
        report.check,
        if report.passed() { "PASSED" } else { "FAILED" },
        s.members_evaluated,
        s.accepted,
        s.errors,
        s.stale,
    );
    for v in report.errors() {
        println!("\n{}", v.message);
    }
    if !report.stale.is_empty() {
        println!(
            "\nAccepted but not seen (remove from {}):",
            report.accepted_file.display()
        );
        for entry in &report.stale {
            println!("  - {} ({})", entry.change, entry.justification);
        }
    }
}

fn cmd_accept(diff: &Path, accepted: &Path, justification: &str, ignore: &[String]) -> Result<()> {
    if justification.trim().is_empty() {
        anyhow::bail!("Justification must not be empty");
    }

    let mut options = CheckOptions::new("accept", accepted);
    options.extra_ignored = parse_ignored(ignore);
    let report = run_check(options, diff).context("Failed to evaluate diff")?;

    let mut file = AcceptanceFile::load_or_default(accepted)
        .with_context(|| format!("Failed to load {:?}", accepted))?;
    let added = file.merge_unresolved(justification, report.unresolved_keys());
    if added == 0 {
        println!("Nothing to accept");
    } else {
        file.save(accepted)
            .with_context(|| format!("Failed to write {:?}", accepted))?;
        println!(
            "Accepted {} change(s) in {} under \"{}\"",
            added,
            accepted.display(),
            justification
        );
    }

    if !report.stale.is_empty() {
        println!(
            "Warning: {} stale entr(ies) remain; `apiguard check` will fail until they are removed",
            report.stale.len()
        );
    }
    Ok(())
}

fn cmd_validate(accepted: &Path) -> Result<()> {
    let registry = AcceptedChangeRegistry::load(accepted)
        .with_context(|| format!("Invalid acceptance file {:?}", accepted))?;
    println!("{}: {} accepted change(s)", accepted.display(), registry.len());
    Ok(())
}
