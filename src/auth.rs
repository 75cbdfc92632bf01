//! OAuth2 authentication for the Gmail API

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tracing::{debug, info};
use yup_oauth2::authenticator_delegate::InstalledFlowDelegate;

use crate::error::{LabelerError, Result};

/// Gmail API scopes required for labeling
///
/// - gmail.modify: read snippets and add labels to messages
/// - gmail.labels: list and create labels
pub const REQUIRED_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.labels",
];

/// Bearer token presented on every API request of a run
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn bearer_token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Source of bearer credentials
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Obtain a credential; `interactive = false` must never prompt the user
    async fn get_token(&self, interactive: bool) -> Result<Credential>;
}

/// Authenticator backed by the installed-application OAuth2 flow
///
/// Tokens are cached on disk and refreshed silently when possible. A consent
/// prompt is only shown for interactive requests.
pub struct OAuthAuthenticator {
    credentials_path: PathBuf,
    token_cache_path: PathBuf,
}

impl OAuthAuthenticator {
    /// # Arguments
    /// * `credentials_path` - Path to the OAuth2 client secret JSON file
    /// * `token_cache_path` - Path where access and refresh tokens are cached
    pub fn new(credentials_path: impl Into<PathBuf>, token_cache_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_cache_path: token_cache_path.into(),
        }
    }

    pub fn token_cache_path(&self) -> &Path {
        &self.token_cache_path
    }

    /// Delete the cached token so the next interactive request asks for consent again
    pub async fn clear_cached_token(&self) -> Result<bool> {
        match tokio::fs::remove_file(&self.token_cache_path).await {
            Ok(()) => {
                info!("Removed cached token at {:?}", self.token_cache_path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Authenticator for OAuthAuthenticator {
    async fn get_token(&self, interactive: bool) -> Result<Credential> {
        let secret = yup_oauth2::read_application_secret(&self.credentials_path)
            .await
            .map_err(|e| LabelerError::AuthError(format!("Failed to read credentials: {}", e)))?;

        if let Some(parent) = self.token_cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // The redirect flow ignores the delegate's answer and waits for the
        // browser, so silent requests go through the code-entry flow instead
        let return_method = if interactive {
            yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect
        } else {
            yup_oauth2::InstalledFlowReturnMethod::Interactive
        };

        let mut builder = yup_oauth2::InstalledFlowAuthenticator::builder(secret, return_method)
            .persist_tokens_to_disk(&self.token_cache_path);

        if !interactive {
            builder = builder.flow_delegate(Box::new(SilentFlowDelegate));
        }

        let auth = builder
            .build()
            .await
            .map_err(|e| LabelerError::AuthError(format!("Failed to build authenticator: {}", e)))?;

        debug!(interactive, "Requesting access token");
        let token = auth
            .token(REQUIRED_SCOPES)
            .await
            .map_err(|e| LabelerError::AuthError(format!("Failed to obtain token: {}", e)))?;

        if tokio::fs::try_exists(&self.token_cache_path).await.unwrap_or(false) {
            secure_token_file(&self.token_cache_path).await?;
        }

        token
            .token()
            .map(Credential::new)
            .ok_or_else(|| LabelerError::AuthError("Provider returned no access token".to_string()))
    }
}

/// Flow delegate that refuses to show a consent URL
///
/// With it installed only cached or refreshable tokens can be obtained.
struct SilentFlowDelegate;

impl InstalledFlowDelegate for SilentFlowDelegate {
    fn present_user_url<'a>(
        &'a self,
        _url: &'a str,
        _need_code: bool,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<String, String>> + Send + 'a>> {
        Box::pin(async {
            Err("user consent is required but the run is non-interactive".to_string())
        })
    }
}

/// Authenticator for an already-issued access token
pub struct StaticTokenAuthenticator {
    token: String,
}

impl StaticTokenAuthenticator {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn get_token(&self, _interactive: bool) -> Result<Credential> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(LabelerError::AuthError("Access token is empty".to_string()));
        }
        Ok(Credential::new(token))
    }
}

/// Secure token file permissions on Unix systems
///
/// Sets file permissions to 0600 (read/write for owner only)
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows relies on the ACLs of the user profile directory
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
