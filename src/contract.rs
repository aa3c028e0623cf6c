//! # contract: data model and seams of the Outline adapter
//!
//! This module defines the plain data types exchanged with Outline and with
//! the host, plus the three traits that separate the layers:
//!
//! - [`HttpTransport`]: a single authenticated JSON POST. Implemented by
//!   [`crate::transport::ReqwestTransport`] and by mocks in tests.
//! - [`Rpc`]: `call(method, params)` against Outline's `/api/<method>` surface,
//!   returning the unwrapped `data` field. Implemented by
//!   [`crate::rpc::OutlineClient`].
//! - [`Datasource`]: the fixed host-facing method set
//!   (`list_collections`, `list_documents`, `fetch_document`, `run`).
//!   Implemented once, by [`crate::datasource::OutlineDatasource`].
//!
//! ## Mocking & Testing
//! - `HttpTransport` and `Rpc` are annotated for `mockall`; the generated
//!   `MockHttpTransport` and `MockRpc` are exported under the default
//!   `test-export-mocks` feature so integration tests can use them.
//!
//! ## Wire shapes
//! Outline speaks camelCase JSON. The structs below decode only the fields
//! this crate uses; everything else in a payload is ignored.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::datasource::ContentRun;
use crate::error::{CredentialError, RpcError};

/// Error type for the transport seam (simple boxed error, like the other seams).
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// API key plus workspace base URL. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    api_key: String,
    base_url: String,
}

impl Credential {
    /// Validates and normalises host-supplied credentials.
    ///
    /// The key and URL must be non-empty and the URL must use http(s).
    /// A trailing `/` on the URL is dropped.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let api_key = api_key.into().trim().to_string();
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        if api_key.is_empty() {
            return Err(CredentialError::MissingApiKey);
        }
        if base_url.is_empty() {
            return Err(CredentialError::MissingWorkspaceUrl);
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CredentialError::InvalidScheme);
        }
        Ok(Self { api_key, base_url })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Workspace URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full endpoint URL for an RPC method, e.g. `<base>/api/documents.info`.
    pub fn endpoint(&self, method: &str) -> String {
        format!("{}/api/{}", self.base_url, method)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// A named grouping of documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    /// Ordered ids of the documents in this collection. Empty when decoded
    /// straight from `collections.list`.
    #[serde(default)]
    pub document_ids: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A document as listed by `documents.list` / `documents.search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub parent_document_id: Option<String>,
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_id: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A full document as returned by `documents.info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Outline markdown.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub parent_document_id: Option<String>,
    /// Empty for drafts that live outside any collection.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub collection_id: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Plain-text record handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedContent {
    pub title: String,
    pub body: String,
    pub document_id: String,
    pub collection_id: String,
}

/// What the host wants `run` to import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

impl Selection {
    pub fn collection(id: impl Into<String>) -> Self {
        Self {
            collections: vec![id.into()],
            documents: Vec::new(),
        }
    }

    pub fn document(id: impl Into<String>) -> Self {
        Self {
            collections: Vec::new(),
            documents: vec![id.into()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.documents.is_empty()
    }
}

/// Team details derived from `auth.info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceInfo {
    pub workspace_name: String,
    pub workspace_id: String,
    pub workspace_url: String,
}

/// The kind of a host-selectable page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Collection,
    Document,
}

impl std::str::FromStr for PageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collection" => Ok(PageKind::Collection),
            "document" => Ok(PageKind::Document),
            other => Err(format!("Unsupported page type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageIcon {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub emoji: String,
}

impl PageIcon {
    pub fn emoji(emoji: impl Into<String>) -> Self {
        Self {
            kind: "emoji",
            emoji: emoji.into(),
        }
    }
}

/// One entry in the host's page picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub page_id: String,
    pub page_name: String,
    pub page_icon: Option<PageIcon>,
    /// Parent document id, else the owning collection id. `None` for collections.
    pub parent_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: PageKind,
    pub url: String,
    pub last_edited_time: Option<String>,
}

/// Everything the host's page picker needs for one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspacePages {
    pub workspace: WorkspaceInfo,
    pub pages: Vec<Page>,
    pub total: usize,
}

/// Rendered markdown for one page plus the ids the host records with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    pub content: String,
    /// Set for document pages, empty otherwise.
    pub document_id: String,
    /// Set for collection pages, empty otherwise.
    pub collection_id: String,
}

/// Raw HTTP response as seen by the RPC layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// A single authenticated JSON POST.
///
/// Implementations return `Err` only when no HTTP response was obtained;
/// every status code, including 4xx/5xx, comes back as `Ok`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;
}

/// Outline's RPC-over-POST surface.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Rpc: Send + Sync {
    /// POST `params` to `/api/<method>` and return the envelope's `data` field.
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError>;
}

/// Host-facing datasource interface with a fixed method set.
#[async_trait]
pub trait Datasource: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<Collection>, RpcError>;

    async fn list_documents(&self, collection_id: &str) -> Result<Vec<DocumentSummary>, RpcError>;

    async fn fetch_document(&self, id: &str) -> Result<Document, RpcError>;

    /// Starts a fresh, one-pass import of `selection`. Nothing is reused from
    /// earlier runs.
    fn run(&self, selection: Selection) -> ContentRun<'_>;
}
