mod args;
mod checks;
mod cmd;
mod config;
mod db;
mod error;
mod host;
mod pr;
mod prompt;
mod reset;
#[cfg(test)]
mod testing;
mod vcs;

use std::process::ExitCode;

use anyhow::Context as _;
use args::{CliArgs, Command};
use camino::Utf8PathBuf;
use clap::Parser as _;
use config::Config;
use error::ShelpError;
use host::{GhCli, PrTarget};
use prompt::{AssumeYes, InquirePrompter, Prompter};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};
use vcs::GitCli;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {err:#}");
            let code = err
                .downcast_ref::<ShelpError>()
                .map_or(1, ShelpError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .init();
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let repo_dir = repo_dir(args.repo_dir)?;
    let remote = args.remote.unwrap_or_else(|| config.remote.clone());
    tracing::debug!(%repo_dir, %remote, "starting");

    match args.command {
        Command::OriginReset => {
            let git = GitCli::open(&repo_dir)?;
            let outcome = reset::origin_reset(&git, &config.primary_branches)?;
            if let Some(previous) = &outcome.previous
                && *previous != outcome.primary
            {
                println!("🔀 {previous} → {}", outcome.primary);
            }
            if let Some(deleted) = &outcome.deleted {
                println!("🗑️ Deleted branch {deleted}");
            }
            println!("✅ {} is up to date", outcome.primary);
        }
        Command::OpenPr { yes } => {
            let git = GitCli::open(&repo_dir)?;
            let gh = GhCli::new(&repo_dir);
            let prompter: &dyn Prompter = if yes { &AssumeYes } else { &InquirePrompter };
            let outcome = pr::open_pr(&git, &gh, prompter, &remote)?;
            let pushed = if outcome.pushed { " (pushed)" } else { "" };
            println!("🌐 Pull request page opened for {}{pushed}", outcome.branch);
        }
        Command::Checks { pr, repo } => {
            let gh = GhCli::new(&repo_dir);
            let target = pr.as_deref().map(PrTarget::parse).transpose()?;
            let repo = repo.or_else(|| target.as_ref().and_then(|t| t.repo.clone()));
            let number = match target {
                Some(target) => target.number,
                None => {
                    let git = GitCli::open(&repo_dir)?;
                    checks::resolve_pr(&gh, &git, repo.as_deref())?
                }
            };
            println!("🔍 Checks for PR #{number}");
            let summary = checks::fetch_summary(&gh, number, repo.as_deref())?;
            println!("{summary}");
        }
        Command::MakeDb { name } => {
            let mysql = db::MysqlCli::new(&config.database);
            db::make_db(&mysql, name.as_deref())?;
        }
        Command::Status => {
            let git = GitCli::open(&repo_dir)?;
            let status = vcs::probe(&git, &remote)?;
            println!("{status}");
        }
    }
    Ok(())
}

fn repo_dir(arg: Option<Utf8PathBuf>) -> anyhow::Result<Utf8PathBuf> {
    if let Some(dir) = arg {
        return Ok(dir);
    }
    let current_dir = std::env::current_dir().context("Cannot read the current directory")?;
    Utf8PathBuf::from_path_buf(current_dir)
        .map_err(|dir| anyhow::anyhow!("Current directory is not valid UTF-8: {}", dir.display()))
}
