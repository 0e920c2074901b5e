//! CLI for github2gitlab.
//!
//! Mirrors a GitHub repository into GitLab and syncs its pull requests
//! into merge requests.

use clap::Parser;
use github2gitlab::{ConfigLayer, RunSummary, Runner, RunnerError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// github2gitlab - Mirror a GitHub repository and its pull requests into GitLab.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file providing defaults for every option.
    #[arg(long)]
    config: Option<PathBuf>,

    /// GitLab URL, e.g. https://gitlab.example.com.
    #[arg(long)]
    gitlab_url: Option<String>,

    /// GitLab private token.
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    gitlab_token: Option<String>,

    /// GitLab project (namespace/name), defaults to the GitHub repository.
    #[arg(long)]
    gitlab_repo: Option<String>,

    /// GitHub repository (owner/name).
    #[arg(long)]
    github_repo: Option<String>,

    /// GitHub token, for private repositories and higher rate limits.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// GitHub REST API URL.
    #[arg(long)]
    github_api_url: Option<String>,

    /// GitHub git URL the mirror is cloned from.
    #[arg(long)]
    github_git_url: Option<String>,

    /// SSH public key registered with GitLab [default: ~/.ssh/id_rsa.pub].
    #[arg(long)]
    ssh_public_key: Option<PathBuf>,

    /// Comma-separated branches to mirror. Every branch by default.
    #[arg(long, value_delimiter = ',', value_name = "BRANCHES")]
    branches: Vec<String>,

    /// Ignore pull requests closed without being merged.
    #[arg(long)]
    ignore_closed: bool,

    /// Mirror the repository only, do not sync merge requests.
    #[arg(long)]
    skip_pull_requests: bool,

    /// Cache the GitHub pull request listing for 24 hours.
    #[arg(long)]
    cache: bool,

    /// Directory of the response cache.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Remove the mirror clone after the run.
    #[arg(long)]
    clean: bool,

    /// Directory holding the mirror clone [default: .].
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Log debug output of github2gitlab.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Settings given on the command line; unset flags leave the file value.
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            gitlab_url: self.gitlab_url.clone(),
            gitlab_token: self.gitlab_token.clone(),
            gitlab_repo: self.gitlab_repo.clone(),
            github_repo: self.github_repo.clone(),
            github_token: self.github_token.clone(),
            github_api_url: self.github_api_url.clone(),
            github_git_url: self.github_git_url.clone(),
            ssh_public_key: self.ssh_public_key.clone(),
            branches: (!self.branches.is_empty()).then(|| self.branches.clone()),
            ignore_closed: self.ignore_closed.then_some(true),
            skip_pull_requests: self.skip_pull_requests.then_some(true),
            cache: self.cache.then_some(true),
            cache_dir: self.cache_dir.clone(),
            clean: self.clean.then_some(true),
            work_dir: self.work_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(args.verbose);

    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::from(0)
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// `RUST_LOG` takes precedence; otherwise the level is `info`, raised to
/// `debug` for this crate with `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "github2gitlab=debug,info"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();
}

/// Main execution logic.
async fn run(args: Args) -> Result<RunSummary, RunnerError> {
    let file = match &args.config {
        Some(path) => ConfigLayer::load(path)?,
        None => ConfigLayer::default(),
    };
    let config = file.merge(args.layer()).into_config()?;

    let runner = Runner::new(config)?;
    runner.run().await
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    if summary.project_created {
        println!(
            "  Project created, branches unprotected: {}",
            summary.branches_unprotected
        );
    }
    println!("  Pull request refs promoted: {}", summary.refs_promoted);

    if summary.pull_requests_skipped {
        println!("  Merge request sync: skipped");
        return;
    }

    println!("  Pull requests seen: {}", summary.proposals_seen);
    println!("  Merge requests created: {}", summary.records_created);
    println!("  Merge requests updated: {}", summary.records_updated);
    println!("  Merge requests unchanged: {}", summary.records_unchanged);
    println!("  Pull requests skipped: {}", summary.proposals_skipped);
    if summary.is_noop() {
        println!("  Merge requests already in sync, nothing written");
    }
    if summary.merge_fallbacks > 0 {
        println!(
            "  Closed with {} instead of merged: {}",
            github2gitlab::MARKER_TAG,
            summary.merge_fallbacks
        );
    }
}
