//! Gmail REST API client

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::auth::Credential;
use crate::error::{LabelerError, Result};
use crate::http::HttpClient;
use crate::models::{CreateLabelRequest, Label, MessageDetail, MessagePage, ModifyMessageRequest};

/// Base URL of the Gmail v1 REST API
pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Maximum number of message references requested per page
pub const PAGE_SIZE: u32 = 100;

/// Gmail operations the labeling pipeline needs
#[async_trait]
pub trait GmailClient: Send + Sync {
    /// Fetch one page of message references, starting at `page_token`
    async fn list_messages_page(
        &self,
        credential: &Credential,
        page_token: Option<String>,
    ) -> Result<MessagePage>;

    /// List all labels in the account
    async fn list_labels(&self, credential: &Credential) -> Result<Vec<Label>>;

    /// Create a label visible in the label list and on messages, returning its ID
    async fn create_label(&self, credential: &Credential, name: &str) -> Result<String>;

    /// Fetch the full representation of a message
    async fn get_message(&self, credential: &Credential, message_id: &str) -> Result<MessageDetail>;

    /// Add a label to a message
    async fn apply_label(&self, credential: &Credential, message_id: &str, label_id: &str) -> Result<()>;
}

/// [`GmailClient`] that speaks the Gmail REST wire format over an [`HttpClient`]
pub struct RestGmailClient {
    http: Arc<dyn HttpClient>,
    api_base: String,
    user_id: String,
}

impl RestGmailClient {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            user_id: "me".to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/users/{}/{}",
            self.api_base.trim_end_matches('/'),
            self.user_id,
            path
        )
    }

    fn endpoint_with_query(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let url = Url::parse_with_params(&self.endpoint(path), query)
            .map_err(|e| LabelerError::ConfigError(format!("Invalid API URL: {}", e)))?;
        Ok(url.into())
    }
}

#[async_trait]
impl GmailClient for RestGmailClient {
    async fn list_messages_page(
        &self,
        credential: &Credential,
        page_token: Option<String>,
    ) -> Result<MessagePage> {
        let page_size = PAGE_SIZE.to_string();
        let mut query = vec![("maxResults", page_size.as_str())];
        if let Some(token) = page_token.as_deref() {
            query.push(("pageToken", token));
        }

        let url = self.endpoint_with_query("messages", &query)?;
        let value = self.http.get_json(&url, credential).await?;

        serde_json::from_value(value)
            .map_err(|e| LabelerError::SchemaError(format!("Invalid message list page: {}", e)))
    }

    async fn list_labels(&self, credential: &Credential) -> Result<Vec<Label>> {
        let value = self.http.get_json(&self.endpoint("labels"), credential).await?;

        let labels = match value.get("labels") {
            Some(Value::Array(labels)) => labels.clone(),
            other => {
                return Err(LabelerError::SchemaError(format!(
                    "Expected labels to be an array, got: {}",
                    other.map(Value::to_string).unwrap_or_else(|| "nothing".to_string())
                )));
            }
        };

        let labels = labels
            .into_iter()
            .map(serde_json::from_value::<Label>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LabelerError::SchemaError(format!("Invalid label: {}", e)))?;

        debug!("Retrieved {} labels", labels.len());
        Ok(labels)
    }

    async fn create_label(&self, credential: &Credential, name: &str) -> Result<String> {
        let body = serde_json::to_value(CreateLabelRequest::visible(name))?;
        let created = self
            .http
            .post_json(&self.endpoint("labels"), credential, &body)
            .await?;

        created
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LabelerError::SchemaError(format!("Created label '{}' has no ID", name)))
    }

    async fn get_message(&self, credential: &Credential, message_id: &str) -> Result<MessageDetail> {
        let url = self.endpoint_with_query(&format!("messages/{}", message_id), &[("format", "full")])?;
        let value = self.http.get_json(&url, credential).await?;

        serde_json::from_value(value).map_err(|e| {
            LabelerError::SchemaError(format!("Invalid message {}: {}", message_id, e))
        })
    }

    async fn apply_label(&self, credential: &Credential, message_id: &str, label_id: &str) -> Result<()> {
        let body = serde_json::to_value(ModifyMessageRequest {
            add_label_ids: vec![label_id.to_string()],
        })?;

        self.http
            .post_json(
                &self.endpoint(&format!("messages/{}/modify", message_id)),
                credential,
                &body,
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mockall::mock! {
    pub TestGmailClient {}

    #[async_trait]
    impl GmailClient for TestGmailClient {
        async fn list_messages_page(&self, credential: &Credential, page_token: Option<String>) -> Result<MessagePage>;
        async fn list_labels(&self, credential: &Credential) -> Result<Vec<Label>>;
        async fn create_label(&self, credential: &Credential, name: &str) -> Result<String>;
        async fn get_message(&self, credential: &Credential, message_id: &str) -> Result<MessageDetail>;
        async fn apply_label(&self, credential: &Credential, message_id: &str, label_id: &str) -> Result<()>;
    }
}
