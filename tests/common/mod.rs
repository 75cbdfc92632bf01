//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use job_mail_labeler::auth::Credential;
use job_mail_labeler::client::GmailClient;
use job_mail_labeler::error::{LabelerError, Result};
use job_mail_labeler::models::{Label, MessageDetail, MessagePage, MessageRef};
use job_mail_labeler::progress::ProgressReporter;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Create mock Gmail list messages response (JSON)
pub fn mock_gmail_list_response(message_ids: &[String], next_page_token: Option<&str>) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = message_ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "threadId": format!("thread_{}", id)
            })
        })
        .collect();

    let mut response = json!({
        "messages": messages,
        "resultSizeEstimate": messages.len()
    });

    if let Some(token) = next_page_token {
        response["nextPageToken"] = json!(token);
    }

    response
}

/// Create mock Gmail message response (JSON) in `format=full` shape
pub fn mock_gmail_message_response(id: &str, snippet: &str) -> serde_json::Value {
    json!({
        "id": id,
        "threadId": format!("thread_{}", id),
        "labelIds": ["INBOX", "UNREAD"],
        "snippet": snippet,
        "payload": {
            "mimeType": "text/plain",
            "headers": [
                {"name": "From", "value": "careers@example.com"},
                {"name": "Subject", "value": "Your application"}
            ]
        },
        "internalDate": "1704124800000",
        "sizeEstimate": 1234
    })
}

/// Create mock Gmail labels list response (JSON) from (id, name) pairs
pub fn mock_gmail_labels_response(labels: &[(&str, &str)]) -> serde_json::Value {
    let labels: Vec<serde_json::Value> = labels
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name, "type": "user" }))
        .collect();
    json!({ "labels": labels })
}

/// Message ids `prefix0..prefixN`
pub fn message_ids(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}{}", prefix, i)).collect()
}

/// Progress reporter that keeps every status line it is given
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.lines.lock().unwrap().last().cloned()
    }
}

impl ProgressReporter for RecordingReporter {
    fn set(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}

#[derive(Default)]
struct MailboxState {
    messages: Vec<(String, Option<String>)>,
    labels: Vec<Label>,
    applied: HashMap<String, HashSet<String>>,
    next_label: usize,
    creates: usize,
    failing_modifies: HashSet<String>,
}

/// In-memory mailbox that behaves like the Gmail API across repeated runs
pub struct FakeMailbox {
    page_size: usize,
    state: Mutex<MailboxState>,
}

impl FakeMailbox {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            state: Mutex::new(MailboxState::default()),
        }
    }

    pub fn with_message(self, id: &str, snippet: Option<&str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .messages
            .push((id.to_string(), snippet.map(str::to_string)));
        self
    }

    pub fn with_label(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().labels.push(Label {
            id: id.to_string(),
            name: Some(name.to_string()),
            label_list_visibility: None,
            message_list_visibility: None,
        });
        self
    }

    /// Make every modify call on `id` fail
    pub fn failing_modify(self, id: &str) -> Self {
        self.state.lock().unwrap().failing_modifies.insert(id.to_string());
        self
    }

    pub fn create_count(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn label_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .labels
            .iter()
            .filter_map(|l| l.name.clone())
            .collect()
    }

    pub fn labels_on(&self, message_id: &str) -> HashSet<String> {
        self.state
            .lock()
            .unwrap()
            .applied
            .get(message_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl GmailClient for FakeMailbox {
    async fn list_messages_page(&self, _credential: &Credential, page_token: Option<String>) -> Result<MessagePage> {
        let state = self.state.lock().unwrap();
        let start = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| LabelerError::TransportError {
                    status: 400,
                    body: format!("Invalid pageToken: {}", token),
                })?,
            None => 0,
        };
        let end = (start + self.page_size).min(state.messages.len());
        let messages = state.messages[start.min(end)..end]
            .iter()
            .map(|(id, _)| MessageRef { id: id.clone() })
            .collect();
        let next_page_token = (end < state.messages.len()).then(|| end.to_string());
        Ok(MessagePage {
            messages,
            next_page_token,
        })
    }

    async fn list_labels(&self, _credential: &Credential) -> Result<Vec<Label>> {
        Ok(self.state.lock().unwrap().labels.clone())
    }

    async fn create_label(&self, _credential: &Credential, name: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state
            .labels
            .iter()
            .any(|l| l.name.as_deref().map(str::to_lowercase) == Some(name.to_lowercase()))
        {
            return Err(LabelerError::TransportError {
                status: 409,
                body: "Label name exists or conflicts".to_string(),
            });
        }
        state.next_label += 1;
        state.creates += 1;
        let id = format!("Label_{}", state.next_label);
        state.labels.push(Label {
            id: id.clone(),
            name: Some(name.to_string()),
            label_list_visibility: Some("labelShow".to_string()),
            message_list_visibility: Some("show".to_string()),
        });
        Ok(id)
    }

    async fn get_message(&self, _credential: &Credential, message_id: &str) -> Result<MessageDetail> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .iter()
            .find(|(id, _)| id == message_id)
            .map(|(id, snippet)| MessageDetail {
                id: Some(id.clone()),
                snippet: snippet.clone(),
            })
            .ok_or_else(|| LabelerError::TransportError {
                status: 404,
                body: "Requested entity was not found.".to_string(),
            })
    }

    async fn apply_label(&self, _credential: &Credential, message_id: &str, label_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_modifies.contains(message_id) {
            return Err(LabelerError::TransportError {
                status: 500,
                body: "Backend Error".to_string(),
            });
        }
        state
            .applied
            .entry(message_id.to_string())
            .or_default()
            .insert(label_id.to_string());
        Ok(())
    }
}
