//! railgun CLI - sync xUnit test results into TestRail.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use railgun::config::{self, Config};
use railgun::reporter::Reporter;
use railgun::testrail::Client;
use railgun::xunit::parse_report;

#[derive(Parser)]
#[command(name = "railgun")]
#[command(about = "Sync xUnit test results into TestRail", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "railgun.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// TestRail base URL (overrides the config file)
    #[arg(long, env = "TESTRAIL_URL")]
    testrail_url: Option<String>,

    /// TestRail account name or email
    #[arg(long, env = "TESTRAIL_USER", hide_env_values = true)]
    testrail_user: Option<String>,

    /// TestRail password or API key
    #[arg(long, env = "TESTRAIL_PASSWORD", hide_env_values = true)]
    testrail_password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a report, match cases and upload verdicts
    Report {
        /// xUnit XML report file
        report: PathBuf,

        /// Log every write without performing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the case correspondence without writing anything
    Match {
        /// xUnit XML report file
        report: PathBuf,
    },

    /// Validate the configuration file
    Validate,

    /// Write a starter configuration file
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.command {
        Commands::Report { report, dry_run } => run_report(&cli, report, *dry_run),
        Commands::Match { report } => run_match(&cli, report),
        Commands::Validate => validate_config(&cli),
        Commands::Init => init_config(&cli.config),
    }
}

/// Load the config file and fold in the CLI/env overrides.
fn load_effective_config(cli: &Cli) -> Result<Config> {
    let mut config = config::load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    if let Some(url) = &cli.testrail_url {
        config.testrail.url = url.clone();
    }
    if config.testrail.url.is_empty() {
        bail!("TestRail URL is not configured; set `testrail.url` or TESTRAIL_URL");
    }

    Ok(config)
}

fn build_client(cli: &Cli, config: &Config) -> Result<Client> {
    let user = cli
        .testrail_user
        .as_deref()
        .context("TestRail user is not configured; set --testrail-user or TESTRAIL_USER")?;
    let password = cli.testrail_password.as_deref().context(
        "TestRail password is not configured; set --testrail-password or TESTRAIL_PASSWORD",
    )?;

    Ok(Client::new(&config.testrail.url, user, password)?)
}

fn run_report(cli: &Cli, report: &Path, dry_run: bool) -> Result<()> {
    let config = load_effective_config(cli)?;
    let client = build_client(cli, &config)?;

    let cases = parse_report(report)
        .with_context(|| format!("Failed to parse report {}", report.display()))?;
    info!("Parsed {} test cases from {}", cases.len(), report.display());

    Reporter::new(&client, &config).execute(&cases, dry_run)?;

    Ok(())
}

fn run_match(cli: &Cli, report: &Path) -> Result<()> {
    let config = load_effective_config(cli)?;
    let client = build_client(cli, &config)?;

    let cases = parse_report(report)
        .with_context(|| format!("Failed to parse report {}", report.display()))?;
    info!("Parsed {} test cases from {}", cases.len(), report.display());

    let matched = Reporter::new(&client, &config).match_cases(&cases, true)?;

    println!(
        "{} of {} executed tests matched:",
        matched.correspondence.len(),
        cases.len()
    );
    for (case, xunit_case) in matched.correspondence.iter() {
        println!(
            "  C{} {} <- {}",
            case.id,
            console::style(&case.title).bold(),
            xunit_case
        );
    }
    if !matched.correspondence.unmatched().is_empty() {
        println!("Unmatched:");
        for xunit_case in matched.correspondence.unmatched() {
            println!("  {}", console::style(xunit_case).yellow());
        }
    }

    Ok(())
}

fn validate_config(cli: &Cli) -> Result<()> {
    let config = load_effective_config(cli)?;

    if config.testrail.plan.is_none() && config.railgun.build_id.is_none() {
        bail!("Either `testrail.plan` or `railgun.build_id` must be set to name the plan");
    }
    if config.matching.xunit_template.is_empty() || config.matching.testrail_template.is_empty() {
        bail!("Matching templates must not be empty");
    }

    println!("Configuration OK: {}", cli.config.display());
    println!("  project:   {}", config.testrail.project);
    println!("  milestone: {}", config.testrail.milestone);
    println!("  suite:     {}", config.testrail.suite);
    println!(
        "  templates: {} <-> {}",
        config.matching.xunit_template, config.matching.testrail_template
    );

    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists, not overwriting", path.display());
    }

    std::fs::write(path, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote starter configuration to {}", path.display());
    println!("Set TESTRAIL_USER and TESTRAIL_PASSWORD before reporting.");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# railgun configuration

[railgun]
# Environment label appended to the run name.
env_description = ""
# Link to the CI job, shown in the run description.
# results_link = "https://ci.example.com/job/123"
# Build under test; names the plan when `testrail.plan` is unset.
# build_id = "123"
# build_link = "https://builds.example.com/123"

[testrail]
url = "https://example.testrail.net"
project = "My Project"
milestone = "1.0"
suite = "Smoke"
plan = "1.0 smoke"

[matching]
# Fields of the executed test: {classname} {methodname} {id} {uuid}
xunit_template = "{id}"
# Fields of the TestRail case: {title} and any custom_* field
testrail_template = "{title}"
# allow_duplicates = false
# add_missing_cases = false
# section_name = "All"

# Extra fields for auto-created cases:
# [matching.case_custom_fields]
# custom_qa_team = "9"
"#;
