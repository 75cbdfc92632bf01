//! Label provisioning with case-insensitive reuse of existing labels
use crate::auth::Credential;
use crate::client::GmailClient;
use crate::error::LabelerError;
use crate::models::{Category, LabelMap};
use crate::progress::ProgressReporter;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Why provisioning stopped, with the step that failed
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Error fetching labels: {0}")]
    List(#[source] LabelerError),

    #[error("Error creating label '{name}': {source}")]
    Create {
        name: String,
        #[source]
        source: LabelerError,
    },
}

impl ProvisionError {
    /// The underlying API or schema error
    pub fn into_inner(self) -> LabelerError {
        match self {
            ProvisionError::List(e) => e,
            ProvisionError::Create { source, .. } => source,
        }
    }
}

/// Resolves the label each category is filed under, creating missing labels
///
/// One manager serves one run; its cache is never shared between runs.
pub struct LabelManager {
    client: Arc<dyn GmailClient>,
    progress: Option<Arc<dyn ProgressReporter>>,
    label_cache: HashMap<String, String>, // lowercase name -> id
    created_labels: Vec<String>,
}

impl LabelManager {
    pub fn new(client: Arc<dyn GmailClient>) -> Self {
        Self {
            client,
            progress: None,
            label_cache: HashMap::new(),
            created_labels: Vec::new(),
        }
    }

    /// Announce each label creation on `progress`
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Loads all existing labels from Gmail into the cache
    ///
    /// Labels without a name are skipped since they can never match.
    pub async fn load_existing_labels(&mut self, credential: &Credential) -> Result<usize, ProvisionError> {
        let labels = self
            .client
            .list_labels(credential)
            .await
            .map_err(ProvisionError::List)?;
        let count = labels.len();

        for label in labels {
            if let Some(name) = label.name {
                // Keep the first label when two names differ only by case
                self.label_cache.entry(name.to_lowercase()).or_insert(label.id);
            }
        }

        info!("Loaded {} existing labels into cache", count);
        Ok(count)
    }

    /// Case-insensitive cache lookup helper
    fn cache_get(&self, name: &str) -> Option<&String> {
        self.label_cache.get(&name.to_lowercase())
    }

    /// Insert into cache with lowercase key
    fn cache_insert(&mut self, name: &str, id: String) {
        self.label_cache.insert(name.to_lowercase(), id);
    }

    /// Returns the ID of the label called `name` (any case), creating it if needed
    pub async fn get_or_create_label(
        &mut self,
        credential: &Credential,
        name: &str,
    ) -> Result<String, ProvisionError> {
        if let Some(id) = self.cache_get(name) {
            debug!("Label '{}' already exists with ID {}", name, id);
            return Ok(id.clone());
        }

        if let Some(progress) = &self.progress {
            progress.set(&format!("Creating label: {}", name));
        }
        info!("Creating label: {}", name);

        let label_id = self
            .client
            .create_label(credential, name)
            .await
            .map_err(|source| ProvisionError::Create {
                name: name.to_string(),
                source,
            })?;

        self.cache_insert(name, label_id.clone());
        self.created_labels.push(label_id.clone());

        info!("Created label \"{}\" with ID: {}", name, label_id);
        Ok(label_id)
    }

    /// Resolve a label ID for every required category
    ///
    /// The current label set is fetched once; categories are then handled in
    /// their stable order. Any failure aborts provisioning.
    pub async fn ensure_labels(
        &mut self,
        credential: &Credential,
        required: &BTreeMap<Category, String>,
    ) -> Result<LabelMap, ProvisionError> {
        self.load_existing_labels(credential).await?;

        let mut label_map = LabelMap::default();
        for (category, label_name) in required {
            let label_id = self.get_or_create_label(credential, label_name).await?;
            debug!("Category {} -> label {} ({})", category, label_name, label_id);
            label_map.insert(*category, label_id);
        }

        info!(
            "Resolved {} labels ({} created)",
            label_map.len(),
            self.created_labels.len()
        );
        Ok(label_map)
    }

    /// IDs of labels created by this manager
    pub fn get_created_labels(&self) -> &[String] {
        &self.created_labels
    }
}
