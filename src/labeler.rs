//! Batch labeling run: authenticate, list, provision labels, classify and label

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::auth::{Authenticator, Credential};
use crate::classifier::EmailClassifier;
use crate::client::GmailClient;
use crate::label_manager::LabelManager;
use crate::models::{Category, LabelMap, MessageRef};
use crate::progress::ProgressReporter;
use crate::report::{Outcome, RunReport};
use crate::scanner::MessageScanner;

/// Stages whose failure aborts the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    Authenticating,
    Listing,
    Provisioning,
}

impl fmt::Display for FailedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailedStage::Authenticating => "authenticating",
            FailedStage::Listing => "listing",
            FailedStage::Provisioning => "provisioning",
        };
        f.write_str(name)
    }
}

/// Where a run currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Authenticating,
    Listing,
    Provisioning,
    /// Working on message `index` (zero-based) of `total`
    Processing { index: usize, total: usize },
    Done { processed: usize },
    Failed { stage: FailedStage, details: String },
}

/// A fatal failure and the stage it happened in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub stage: FailedStage,
    pub details: String,
    /// HTTP status of the rejected request, when the API answered
    pub status: Option<u16>,
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub processed_count: usize,
    pub failure: Option<RunFailure>,
    /// Per-message outcomes; empty when the run failed before processing
    pub report: RunReport,
}

impl RunResult {
    fn done(report: RunReport) -> Self {
        Self {
            processed_count: report.count(Outcome::Applied),
            failure: None,
            report,
        }
    }

    fn failed(failure: RunFailure) -> Self {
        Self {
            processed_count: 0,
            failure: Some(failure),
            report: RunReport::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// The single terminal status shown to the user
    pub fn status_line(&self) -> String {
        match &self.failure {
            None => format!("Processed {} messages.", self.processed_count),
            Some(failure) => format!("Error: {}", failure.details),
        }
    }
}

/// Drives a complete labeling run
///
/// `run_batch` borrows the labeler mutably, so one labeler can never have two
/// runs in flight.
pub struct BatchLabeler {
    authenticator: Arc<dyn Authenticator>,
    client: Arc<dyn GmailClient>,
    progress: Arc<dyn ProgressReporter>,
    stage: RunStage,
}

impl BatchLabeler {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        client: Arc<dyn GmailClient>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            authenticator,
            client,
            progress,
            stage: RunStage::Idle,
        }
    }

    /// Stage reached by the most recent run
    pub fn stage(&self) -> &RunStage {
        &self.stage
    }

    /// Run the whole pipeline once
    ///
    /// Authentication, listing and label provisioning are all-or-nothing.
    /// Once messages are being processed a failure only skips that message.
    pub async fn run_batch(&mut self, interactive: bool) -> RunResult {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        self.execute(interactive).instrument(span).await
    }

    async fn execute(&mut self, interactive: bool) -> RunResult {
        info!(interactive, "Starting labeling run");

        self.transition(RunStage::Authenticating);
        self.progress.set("Authenticating...");
        let credential = match self.authenticator.get_token(interactive).await {
            Ok(credential) => credential,
            Err(e) => return self.fail(FailedStage::Authenticating, e.to_string(), None),
        };

        self.transition(RunStage::Listing);
        self.progress.set("Fetching all messages...");
        let scanner = MessageScanner::new(Arc::clone(&self.client));
        let messages = match scanner.list_all_messages(&credential).await {
            Ok(messages) => messages,
            Err(e) => {
                let status = e.status();
                return self.fail(
                    FailedStage::Listing,
                    format!("Error fetching messages: {}", e),
                    status,
                );
            }
        };

        self.transition(RunStage::Provisioning);
        let mut label_manager =
            LabelManager::new(Arc::clone(&self.client)).with_progress(Arc::clone(&self.progress));
        let label_map = match label_manager
            .ensure_labels(&credential, &Category::required_labels())
            .await
        {
            Ok(label_map) => label_map,
            Err(e) => {
                let details = e.to_string();
                let status = e.into_inner().status();
                return self.fail(FailedStage::Provisioning, details, status);
            }
        };

        let report = self
            .process_messages(&credential, &messages, &label_map)
            .await;

        info!(
            listed = messages.len(),
            labels_created = label_manager.get_created_labels().len(),
            applied = report.count(Outcome::Applied),
            unclassified = report.count(Outcome::Unclassified),
            failed = report.count(Outcome::Failed),
            by_category = ?report.applied_by_category(),
            "Labeling run finished"
        );

        let result = RunResult::done(report);
        self.transition(RunStage::Done {
            processed: result.processed_count,
        });
        self.progress.set(&result.status_line());
        result
    }

    /// Classify and label each message in turn
    async fn process_messages(
        &mut self,
        credential: &Credential,
        messages: &[MessageRef],
        label_map: &LabelMap,
    ) -> RunReport {
        let classifier = EmailClassifier::new(Arc::clone(&self.client));
        let total = messages.len();
        let mut report = RunReport::default();

        for (index, message) in messages.iter().enumerate() {
            self.transition(RunStage::Processing { index, total });
            self.progress
                .set(&format!("Labeling messages ({}/{})...", index + 1, total));

            let Some(category) = classifier.classify(credential, &message.id).await else {
                report.record(&message.id, None, Outcome::Unclassified);
                continue;
            };

            let Some(label_id) = label_map.get(category) else {
                error!(
                    "Label ID not found for category: {}. Skipping message {}",
                    category, message.id
                );
                report.record(&message.id, Some(category), Outcome::Failed);
                continue;
            };

            match self.client.apply_label(credential, &message.id, label_id).await {
                Ok(()) => report.record(&message.id, Some(category), Outcome::Applied),
                Err(e) => {
                    warn!("Error modifying message {}: {}", message.id, e);
                    report.record(&message.id, Some(category), Outcome::Failed);
                }
            }
        }

        report
    }

    fn transition(&mut self, stage: RunStage) {
        debug!(?stage, "Run stage");
        self.stage = stage;
    }

    fn fail(&mut self, stage: FailedStage, details: String, status: Option<u16>) -> RunResult {
        error!(%stage, "Run failed: {}", details);
        self.stage = RunStage::Failed {
            stage,
            details: details.clone(),
        };
        let result = RunResult::failed(RunFailure {
            stage,
            details,
            status,
        });
        self.progress.set(&result.status_line());
        result
    }
}

#[cfg(test)]
mockall::mock! {
    pub TestAuthenticator {}

    #[async_trait::async_trait]
    impl Authenticator for TestAuthenticator {
        async fn get_token(&self, interactive: bool) -> crate::error::Result<Credential>;
    }
}
