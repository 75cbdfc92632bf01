//! Mailbox scanner that enumerates every message reference

use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::Credential;
use crate::client::GmailClient;
use crate::error::Result;
use crate::models::MessageRef;

/// Walks `messages.list` pages until the continuation token runs out
pub struct MessageScanner {
    client: Arc<dyn GmailClient>,
}

impl MessageScanner {
    pub fn new(client: Arc<dyn GmailClient>) -> Self {
        Self { client }
    }

    /// List every message in the mailbox, in the order the pages return them
    ///
    /// The first failed page request aborts the scan; references gathered so
    /// far are discarded.
    pub async fn list_all_messages(&self, credential: &Credential) -> Result<Vec<MessageRef>> {
        let mut all_messages = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .client
                .list_messages_page(credential, page_token.take())
                .await?;
            pages += 1;

            debug!(
                page = pages,
                count = page.messages.len(),
                "Fetched message page"
            );
            all_messages.extend(page.messages);

            // An empty token means the same as no token
            page_token = page.next_page_token.filter(|token| !token.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        info!(
            "Total messages fetched: {} ({} pages)",
            all_messages.len(),
            pages
        );
        Ok(all_messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockTestGmailClient;
    use crate::error::LabelerError;
    use crate::models::MessagePage;
    use mockall::predicate::*;
    use mockall::Sequence;

    fn page(ids: &[&str], next: Option<&str>) -> MessagePage {
        MessagePage {
            messages: ids
                .iter()
                .map(|id| MessageRef { id: id.to_string() })
                .collect(),
            next_page_token: next.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_follows_continuation_tokens_in_order() {
        let mut mock_client = MockTestGmailClient::new();
        let mut seq = Sequence::new();

        mock_client
            .expect_list_messages_page()
            .with(always(), eq(None::<String>))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(&["a", "b"], Some("t1"))));

        mock_client
            .expect_list_messages_page()
            .with(always(), eq(Some("t1".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(&["c"], Some("t2"))));

        mock_client
            .expect_list_messages_page()
            .with(always(), eq(Some("t2".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(&["d", "e"], None)));

        let scanner = MessageScanner::new(Arc::new(mock_client));
        let messages = scanner
            .list_all_messages(&Credential::new("token"))
            .await
            .unwrap();

        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_empty_mailbox() {
        let mut mock_client = MockTestGmailClient::new();
        mock_client
            .expect_list_messages_page()
            .times(1)
            .returning(|_, _| Ok(MessagePage::default()));

        let scanner = MessageScanner::new(Arc::new(mock_client));
        let messages = scanner
            .list_all_messages(&Credential::new("token"))
            .await
            .unwrap();

        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_empty_token_ends_pagination() {
        let mut mock_client = MockTestGmailClient::new();
        mock_client
            .expect_list_messages_page()
            .times(1)
            .returning(|_, _| Ok(page(&["a"], Some(""))));

        let scanner = MessageScanner::new(Arc::new(mock_client));
        let messages = scanner
            .list_all_messages(&Credential::new("token"))
            .await
            .unwrap();

        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_aborts_on_first_page_error() {
        let mut mock_client = MockTestGmailClient::new();
        let mut seq = Sequence::new();

        mock_client
            .expect_list_messages_page()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(&["a"], Some("t1"))));

        mock_client
            .expect_list_messages_page()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Err(LabelerError::TransportError {
                    status: 500,
                    body: "backend error".to_string(),
                })
            });

        let scanner = MessageScanner::new(Arc::new(mock_client));
        let err = scanner
            .list_all_messages(&Credential::new("token"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
    }
}
