//! Snippet classification with fixed keyword rules

use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::Credential;
use crate::client::GmailClient;
use crate::error::{LabelerError, Result};
use crate::models::Category;

/// Keyword rules in priority order; the first rule with a matching phrase wins
const RULES: &[(Category, &[&str])] = &[
    (Category::Successful, &["congratulations", "excited to announce"]),
    (Category::Unsuccessful, &["regret to", "other candidates"]),
    (Category::Submitted, &["submitted"]),
];

/// Classify a snippet by case-insensitive substring containment
///
/// Matching is not word-bounded: "resubmitted" counts as "submitted".
pub fn classify_snippet(snippet: &str) -> Option<Category> {
    let lower = snippet.to_lowercase();
    RULES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|phrase| lower.contains(phrase)))
        .map(|(category, _)| *category)
}

/// Fetches message snippets and classifies them
pub struct EmailClassifier {
    client: Arc<dyn GmailClient>,
}

impl EmailClassifier {
    pub fn new(client: Arc<dyn GmailClient>) -> Self {
        Self { client }
    }

    /// Classify one message; `None` means "leave it unlabeled"
    ///
    /// Fetch and parse failures are logged and treated as no match.
    pub async fn classify(&self, credential: &Credential, message_id: &str) -> Option<Category> {
        match self.try_classify(credential, message_id).await {
            Ok(category) => {
                debug!(message_id, category = ?category, "Classified message");
                category
            }
            Err(e) => {
                warn!("Error classifying message {}: {}", message_id, e);
                None
            }
        }
    }

    async fn try_classify(&self, credential: &Credential, message_id: &str) -> Result<Option<Category>> {
        let message = self
            .client
            .get_message(credential, message_id)
            .await
            .map_err(|e| {
                LabelerError::ClassificationError(format!(
                    "Error fetching message details for {}: {}",
                    message_id, e
                ))
            })?;

        Ok(classify_snippet(message.snippet.as_deref().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockTestGmailClient;
    use crate::models::MessageDetail;
    use mockall::predicate::*;
    use proptest::prelude::*;

    #[test]
    fn test_successful_phrases() {
        assert_eq!(
            classify_snippet("Congratulations! We'd like to offer you the role"),
            Some(Category::Successful)
        );
        assert_eq!(
            classify_snippet("We are EXCITED TO ANNOUNCE that you passed"),
            Some(Category::Successful)
        );
    }

    #[test]
    fn test_unsuccessful_phrases() {
        assert_eq!(
            classify_snippet("We regret to inform you that the position has been filled"),
            Some(Category::Unsuccessful)
        );
        assert_eq!(
            classify_snippet("we decided to move forward with other candidates"),
            Some(Category::Unsuccessful)
        );
    }

    #[test]
    fn test_submitted_matches_substrings() {
        assert_eq!(
            classify_snippet("Your application was submitted"),
            Some(Category::Submitted)
        );
        assert_eq!(
            classify_snippet("Your form has been resubmitted"),
            Some(Category::Submitted)
        );
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            classify_snippet("Congratulations, although we regret to say the other role is gone"),
            Some(Category::Successful)
        );
        assert_eq!(
            classify_snippet("We regret to tell you: the application you submitted was declined"),
            Some(Category::Unsuccessful)
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(classify_snippet(""), None);
        assert_eq!(classify_snippet("Your weekly newsletter is here"), None);
        // Word boundaries are not required, but the whole phrase is
        assert_eq!(classify_snippet("we regret nothing"), None);
    }

    proptest! {
        #[test]
        fn prop_successful_phrase_always_wins(
            prefix in "[a-z ]{0,20}",
            middle in "[a-z ]{0,20}",
            success in prop::sample::select(vec!["congratulations", "Excited To Announce"]),
            rejection in prop::sample::select(vec!["regret to", "OTHER CANDIDATES"]),
            rejection_first in any::<bool>(),
        ) {
            let snippet = if rejection_first {
                format!("{}{}{}{}", prefix, rejection, middle, success)
            } else {
                format!("{}{}{}{}", prefix, success, middle, rejection)
            };
            prop_assert_eq!(classify_snippet(&snippet), Some(Category::Successful));
        }

        #[test]
        fn prop_digits_never_match(snippet in "[0-9 .,!?]{0,64}") {
            prop_assert_eq!(classify_snippet(&snippet), None);
        }
    }

    #[tokio::test]
    async fn test_classify_fetches_snippet() {
        let mut mock_client = MockTestGmailClient::new();
        mock_client
            .expect_get_message()
            .with(always(), eq("m1"))
            .times(1)
            .returning(|_, _| {
                Ok(MessageDetail {
                    id: Some("m1".to_string()),
                    snippet: Some("Thank you, your application has been submitted.".to_string()),
                })
            });

        let classifier = EmailClassifier::new(Arc::new(mock_client));
        let category = classifier.classify(&Credential::new("token"), "m1").await;
        assert_eq!(category, Some(Category::Submitted));
    }

    #[tokio::test]
    async fn test_missing_snippet_is_unclassified() {
        let mut mock_client = MockTestGmailClient::new();
        mock_client
            .expect_get_message()
            .times(1)
            .returning(|_, _| Ok(MessageDetail::default()));

        let classifier = EmailClassifier::new(Arc::new(mock_client));
        assert_eq!(classifier.classify(&Credential::new("token"), "m1").await, None);
    }

    #[tokio::test]
    async fn test_fetch_error_is_absorbed() {
        let mut mock_client = MockTestGmailClient::new();
        mock_client.expect_get_message().times(1).returning(|_, _| {
            Err(LabelerError::TransportError {
                status: 404,
                body: "Requested entity was not found.".to_string(),
            })
        });

        let classifier = EmailClassifier::new(Arc::new(mock_client));
        assert_eq!(classifier.classify(&Credential::new("token"), "gone").await, None);
    }
}
