use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::{Credential, Selection};
use crate::datasource::DEFAULT_PAGE_SIZE;
use crate::error::CredentialError;

/// Environment variable holding the Outline API key.
pub const API_KEY_ENV: &str = "OUTLINE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasourceConfig {
    pub workspace_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub selection: Selection,
    /// Injected from the environment, never read from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl DatasourceConfig {
    /// Validated credential built from the file's URL and the injected key.
    pub fn credential(&self) -> Result<Credential, CredentialError> {
        Credential::new(self.api_key.clone().unwrap_or_default(), &self.workspace_url)
    }

    pub fn trace_loaded(&self) {
        info!(
            workspace_url = %self.workspace_url,
            page_size = self.page_size,
            collections = self.selection.collections.len(),
            documents = self.selection.documents.len(),
            api_key_set = self.api_key.is_some(),
            "Loaded DatasourceConfig"
        );
        debug!(selection = ?self.selection, "DatasourceConfig selection (full debug)");
    }
}
