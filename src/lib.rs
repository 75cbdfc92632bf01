//! Job Mail Labeler
//!
//! Scans a Gmail mailbox, sorts job application emails into outcome
//! categories by their snippet text, and files each one under a matching
//! label.
//!
//! # Overview
//!
//! - **Authentication**: OAuth2 installed-app flow with token caching
//! - **Scanning**: paginated listing of every message id in the mailbox
//! - **Label Management**: case-insensitive reuse or creation of outcome labels
//! - **Classification**: fixed keyword rules over message snippets
//! - **Labeling**: a sequential batch run that tolerates per-message failures
//! - **Reporting**: a CSV of each message's category and outcome
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use job_mail_labeler::auth::OAuthAuthenticator;
//! use job_mail_labeler::client::RestGmailClient;
//! use job_mail_labeler::http::ReqwestHttpClient;
//! use job_mail_labeler::labeler::BatchLabeler;
//! use job_mail_labeler::progress::LogReporter;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http = ReqwestHttpClient::new(None)?;
//!     let client = RestGmailClient::new(Arc::new(http));
//!     let authenticator = OAuthAuthenticator::new(
//!         "credentials.json",
//!         ".job-mail-labeler/token.json",
//!     );
//!
//!     let mut labeler = BatchLabeler::new(
//!         Arc::new(authenticator),
//!         Arc::new(client),
//!         Arc::new(LogReporter),
//!     );
//!     let result = labeler.run_batch(true).await;
//!     println!("{}", result.status_line());
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and credentials
//! - [`http`] - JSON-over-HTTP transport
//! - [`client`] - Gmail REST operations
//! - [`scanner`] - Paginated message listing
//! - [`label_manager`] - Label lookup and creation
//! - [`classifier`] - Snippet classification
//! - [`labeler`] - Batch run orchestration
//! - [`progress`] - Status reporting
//! - [`report`] - Per-message outcome report (CSV)
//! - [`config`] - Configuration management
//! - [`cli`] - Command-line interface
//! - [`models`] - Core data structures
//! - [`error`] - Error types and result aliases

pub mod auth;
pub mod classifier;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod label_manager;
pub mod labeler;
pub mod models;
pub mod progress;
pub mod report;
pub mod scanner;

// Re-export commonly used types for convenience
pub use error::{LabelerError, Result};

// Core data models
pub use models::{Category, Label, LabelMap, MessageDetail, MessagePage, MessageRef};

pub use auth::{Authenticator, Credential, OAuthAuthenticator, StaticTokenAuthenticator};
pub use classifier::{classify_snippet, EmailClassifier};
pub use client::{GmailClient, RestGmailClient};
pub use config::Config;
pub use http::{HttpClient, ReqwestHttpClient};
pub use label_manager::{LabelManager, ProvisionError};
pub use labeler::{BatchLabeler, FailedStage, RunFailure, RunResult, RunStage};
pub use progress::{LogReporter, ProgressReporter, SpinnerReporter};
pub use report::{MessageOutcome, Outcome, RunReport};
pub use scanner::MessageScanner;
