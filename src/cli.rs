//! Command-line interface

use clap::{Parser, Subcommand};
use indicatif::MultiProgress;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::auth::{Authenticator, OAuthAuthenticator, StaticTokenAuthenticator};
use crate::classifier::classify_snippet;
use crate::client::{GmailClient, RestGmailClient};
use crate::config::Config;
use crate::error::{LabelerError, Result};
use crate::http::ReqwestHttpClient;
use crate::labeler::{BatchLabeler, FailedStage, RunFailure, RunResult};
use crate::models::Category;
use crate::progress::{ProgressReporter, SpinnerReporter};

#[derive(Parser, Debug)]
#[command(name = "job-mail-labeler")]
#[command(version = "0.1.0")]
#[command(about = "Label job application emails in Gmail by outcome", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify every message in the mailbox and apply outcome labels
    Run {
        /// Never open a browser for consent; fail if no cached token is usable
        #[arg(long)]
        non_interactive: bool,

        /// Use this OAuth access token instead of the installed-app flow
        #[arg(long, env = "GMAIL_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,

        /// Write a CSV of every message's category and outcome to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Authenticate with Gmail API
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// Show which category a piece of text would be filed under
    Classify {
        /// Snippet text to classify
        text: String,
    },

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

fn build_client(config: &Config) -> Result<Arc<dyn GmailClient>> {
    let http = ReqwestHttpClient::new(config.api.request_timeout())?;
    let client = RestGmailClient::new(Arc::new(http))
        .with_api_base(config.api.base_url.clone())
        .with_user_id(config.api.user_id.clone());
    Ok(Arc::new(client))
}

fn build_authenticator(config: &Config, access_token: Option<String>) -> Arc<dyn Authenticator> {
    match access_token {
        Some(token) => Arc::new(StaticTokenAuthenticator::new(token)),
        None => Arc::new(OAuthAuthenticator::new(
            config.auth.credentials_path.clone(),
            config.auth.token_cache_path.clone(),
        )),
    }
}

/// Suggest a next step for failures the user can fix
pub fn failure_hint(failure: &RunFailure) -> Option<&'static str> {
    match (failure.stage, failure.status) {
        (FailedStage::Authenticating, _) => {
            Some("Run `job-mail-labeler auth` to sign in, or pass --access-token")
        }
        (_, Some(401)) => Some("The access token was rejected; run `job-mail-labeler auth --force`"),
        (_, Some(403)) => {
            Some("The token lacks Gmail permissions; run `job-mail-labeler auth --force` and grant access")
        }
        _ => None,
    }
}

/// Run one labeling batch, showing progress on `multi`
///
/// The report is only written for runs that reached message processing.
pub async fn run_labeling(
    config: &Config,
    non_interactive: bool,
    access_token: Option<String>,
    report_path: Option<&Path>,
    multi: MultiProgress,
) -> Result<RunResult> {
    let client = build_client(config)?;
    let authenticator = build_authenticator(config, access_token);
    let spinner = Arc::new(SpinnerReporter::new(multi));
    let progress: Arc<dyn ProgressReporter> = spinner.clone();

    let mut labeler = BatchLabeler::new(authenticator, client, progress);
    let result = labeler.run_batch(!non_interactive).await;

    spinner.finish(&result.status_line());

    match &result.failure {
        Some(failure) => {
            if let Some(hint) = failure_hint(failure) {
                eprintln!("{}", hint);
            }
        }
        None => {
            if let Some(path) = report_path {
                result.report.write_csv(path)?;
                println!("Report written to {:?}", path);
            }
        }
    }

    Ok(result)
}

/// Obtain (and cache) an OAuth token, then check it against the labels endpoint
pub async fn authenticate(config: &Config, force: bool) -> Result<usize> {
    let authenticator = OAuthAuthenticator::new(
        config.auth.credentials_path.clone(),
        config.auth.token_cache_path.clone(),
    );

    if force && authenticator.clear_cached_token().await? {
        info!("Removed existing token cache");
    }

    let credential = authenticator.get_token(true).await?;
    println!("Successfully authenticated with Gmail API");
    println!("Token cached at: {:?}", authenticator.token_cache_path());

    let labels = build_client(config)?.list_labels(&credential).await?;
    println!("Connected; {} labels visible", labels.len());
    Ok(labels.len())
}

/// Classify `text` offline and describe the result
pub fn describe_classification(text: &str) -> String {
    match classify_snippet(text) {
        Some(category) => format!("{} -> {}", category, category.label_name()),
        None => "unclassified (no label would be applied)".to_string(),
    }
}

/// Write the default configuration to `output`
pub async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(LabelerError::ConfigError(format!(
            "{:?} already exists; pass --force to overwrite",
            output
        )));
    }
    Config::create_example(output).await?;
    println!("Created example configuration at {:?}", output);
    println!("Labels applied by this tool:");
    for category in Category::ALL {
        println!("  {:<12} {}", category.as_str(), category.label_name());
    }
    Ok(())
}
