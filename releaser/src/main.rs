//! Release-engineering CLI.
//!
//! `releaser release` cuts a release branch across every configured
//! repository; `releaser deploy` triggers the Jenkins builds for an
//! environment.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

use releaser::core::outcome::RunOutcome;
use releaser::deploy::{DEFAULT_BRANCH, DEFAULT_ENV, DeployRequest, run_deploy};
use releaser::exit_codes;
use releaser::io::config::{DEFAULT_CONFIG_FILE, ReleaserConfig, load_config};
use releaser::io::credentials::load_credentials;
use releaser::io::driver::CommandDriver;
use releaser::io::process::SystemRunner;
use releaser::logging;
use releaser::release::{ReleaseSettings, run_release};

#[derive(Parser)]
#[command(
    name = "releaser",
    version,
    about = "Multi-repository release branch-cut and deploy trigger"
)]
struct Cli {
    /// Path to the releaser config file (defaults apply if it does not exist).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cut `--to` from `--from` in every repository, repoint the shared submodule, and push.
    Release {
        /// Existing branch to start the release from.
        #[arg(long)]
        from: String,
        /// New release branch to create.
        #[arg(long)]
        to: String,
    },
    /// Trigger the Jenkins build of every repository for an environment.
    Deploy {
        /// Environment to deploy to.
        #[arg(long, default_value = DEFAULT_ENV)]
        env: String,
        /// Branch to deploy.
        #[arg(long, default_value = DEFAULT_BRANCH)]
        branch: String,
        /// `.env` file with Jenkins credentials (overrides `deploy.credentials_path`).
        #[arg(long)]
        credentials: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let cfg = load_config(&cli.config)?;
    match cli.command {
        Command::Release { from, to } => cmd_release(&cfg, &from, &to),
        Command::Deploy {
            env,
            branch,
            credentials,
        } => cmd_deploy(&cfg, DeployRequest { env, branch }, credentials),
    }
}

fn cmd_release(cfg: &ReleaserConfig, from: &str, to: &str) -> Result<i32> {
    let runner = SystemRunner::new(cfg.command_timeout(), cfg.output_limit_bytes);
    let settings = ReleaseSettings::from(cfg);
    let outcome = run_release(&runner, &settings, &cfg.repositories, from, to)?;
    match &outcome {
        RunOutcome::Completed { repositories } => {
            println!(
                "release: from={} to={} repositories={}",
                from.trim(),
                to.trim(),
                repositories.join(",")
            );
            Ok(exit_codes::OK)
        }
        RunOutcome::Aborted { completed, .. } => {
            if !completed.is_empty() {
                warn!(
                    pushed = %completed.join(","),
                    "release branch already pushed for these repositories"
                );
            }
            eprintln!("error: {outcome}");
            Ok(exit_codes::ABORTED)
        }
    }
}

fn cmd_deploy(
    cfg: &ReleaserConfig,
    request: DeployRequest,
    credentials: Option<PathBuf>,
) -> Result<i32> {
    cfg.deploy.validate()?;
    let credentials_path = credentials.unwrap_or_else(|| cfg.deploy.credentials_path.clone());
    let credentials = load_credentials(&credentials_path)?;
    let driver = CommandDriver::new(cfg.deploy.driver_command.clone(), cfg.deploy.driver_timeout())?;
    let alert = run_deploy(&driver, &cfg.deploy, &credentials, &request)?;
    println!("{alert}");
    Ok(exit_codes::OK)
}
