use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Minimal message handle returned by `messages.list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

/// One page of `messages.list`
///
/// Gmail omits `messages` entirely when the mailbox (or the page) is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// A Gmail label as returned by `labels.list` and `labels.create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_list_visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_list_visibility: Option<String>,
}

/// Body of `labels.create`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelRequest {
    pub name: String,
    pub label_list_visibility: String,
    pub message_list_visibility: String,
}

impl CreateLabelRequest {
    /// A label shown both in the label list and on messages
    pub fn visible(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label_list_visibility: "labelShow".to_string(),
            message_list_visibility: "show".to_string(),
        }
    }
}

/// The part of a `messages.get?format=full` response we read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDetail {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Body of `messages.modify`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyMessageRequest {
    pub add_label_ids: Vec<String>,
}

/// Outcome category of a classified message
///
/// Declaration order is the order labels are provisioned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Successful,
    Unsuccessful,
    Submitted,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Successful,
        Category::Unsuccessful,
        Category::Submitted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Successful => "successful",
            Category::Unsuccessful => "unsuccessful",
            Category::Submitted => "submitted",
        }
    }

    /// Name of the Gmail label messages of this category receive
    pub fn label_name(&self) -> &'static str {
        match self {
            Category::Successful => "successful_emails",
            Category::Unsuccessful => "unsuccessful_emails",
            Category::Submitted => "submitted_emails",
        }
    }

    /// The fixed category -> label name mapping every run provisions
    pub fn required_labels() -> BTreeMap<Category, String> {
        Self::ALL
            .iter()
            .map(|category| (*category, category.label_name().to_string()))
            .collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category -> Gmail label id, resolved once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    ids: BTreeMap<Category, String>,
}

impl LabelMap {
    pub(crate) fn insert(&mut self, category: Category, label_id: String) {
        self.ids.insert(category, label_id);
    }

    pub fn get(&self, category: Category) -> Option<&str> {
        self.ids.get(&category).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}
