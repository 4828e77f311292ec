//! Sitewright CLI entrypoint.
//!
//! This is the main entrypoint for the sitewright command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sitewright::cli::{Cli, Commands, OutputFormatter};
use sitewright::config::{find_config_file, ConfigParser, ConfigValidator, PublishConfig};
use sitewright::error::Result;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Validate { warnings } => cmd_validate(cli.config.as_ref(), warnings, &formatter),
        Commands::Publish { directory } => {
            cmd_publish(cli.config.as_ref(), directory, &formatter).await
        }
        Commands::Cleanup {
            resource_group,
            yes,
        } => cmd_cleanup(cli.config.as_ref(), resource_group, yes, &formatter).await,
    }
}

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.clone()),
        None => {
            let cwd = std::env::current_dir()?;
            find_config_file(cwd)
        }
    }
}

/// Loads the configuration with .env and environment overrides applied.
fn load_config(config_path: Option<&PathBuf>) -> Result<PublishConfig> {
    let config_file = resolve_config_path(config_path)?;

    let parser = ConfigParser::new().with_base_path(
        config_file
            .parent()
            .unwrap_or_else(|| Path::new(".")),
    );
    parser.load_dotenv()?;

    parser.load_with_env(&config_file)
}

/// Initialize a new project.
fn cmd_init(path: &PathBuf, force: bool) -> Result<()> {
    info!("Initializing new Sitewright project in: {}", path.display());

    let config_path = path.join("sitewright.publish.yaml");
    let env_path = path.join(".env.example");
    let template_path = path.join("site-template.json");
    let gitignore_path = path.join(".gitignore");

    // Check if files exist
    if !force && config_path.exists() {
        eprintln!("Configuration file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    // Create directory if needed
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    // Write config template
    let config_template = include_str!("../templates/sitewright.publish.yaml");
    std::fs::write(&config_path, config_template)?;
    eprintln!("Created: {}", config_path.display());

    // Write .env.example
    let env_template = include_str!("../templates/.env.example");
    std::fs::write(&env_path, env_template)?;
    eprintln!("Created: {}", env_path.display());

    // Write the starter ARM template
    let site_template = include_str!("../templates/site-template.json");
    std::fs::write(&template_path, site_template)?;
    eprintln!("Created: {}", template_path.display());

    // Write/update .gitignore
    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        if !existing.contains(".env") {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&gitignore_path)?;
            writeln!(file, "\n# Sitewright")?;
            writeln!(file, ".env")?;
            eprintln!("Updated: {}", gitignore_path.display());
        }
    } else {
        std::fs::write(&gitignore_path, ".env\n")?;
        eprintln!("Created: {}", gitignore_path.display());
    }

    eprintln!("\nProject initialized successfully!");
    eprintln!("Next steps:");
    eprintln!("  1. Copy .env.example to .env and fill in your Azure credentials");
    eprintln!("  2. Edit sitewright.publish.yaml with your site configuration");
    eprintln!("  3. Run 'sitewright validate' to check your configuration");
    eprintln!("  4. Run 'sitewright publish' to provision and upload your site");

    Ok(())
}

/// Validate configuration.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;

    let validator = ConfigValidator::new();
    let result = validator.validate(&config)?;

    eprintln!("{}", formatter.format_validation(&result, show_warnings));

    eprintln!("\nConfiguration summary:");
    eprintln!("  Site: {}", config.site.app_name);
    eprintln!("  Resource group: {}", config.site.resource_group);
    eprintln!("  Region: {}", config.site.region);
    eprintln!("  Directory: {}", config.site.directory.display());

    Ok(())
}

/// Provision (if needed) and publish the site.
async fn cmd_publish(
    config_path: Option<&PathBuf>,
    directory: Option<PathBuf>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(directory) = directory {
        config.site.directory = directory;
    }

    let outcome = sitewright::publisher::publish(&config).await?;

    eprintln!("{}", formatter.format_outcome(&outcome));

    Ok(())
}

/// Delete the site's resource group.
async fn cmd_cleanup(
    config_path: Option<&PathBuf>,
    resource_group: Option<String>,
    auto_approve: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;

    let resource_group = resource_group.unwrap_or_else(|| config.site.resource_group.clone());

    // Confirm
    if !auto_approve {
        eprint!(
            "This will delete resource group '{resource_group}' and everything in it. Continue? [y/N]: "
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("Cleanup cancelled.");
            return Ok(());
        }
    }

    sitewright::publisher::cleanup(&config, &resource_group).await?;

    eprintln!("{}", formatter.format_cleanup(&resource_group));

    Ok(())
}
