//! Coordinator: sequences Outline calls and hands extracted content to the host.
//!
//! [`OutlineDatasource`] is the single implementation of
//! [`Datasource`](crate::contract::Datasource). It owns an [`Rpc`] client and
//! turns raw `data` payloads into typed values. Imports go through
//! [`ContentRun`], a lazy one-pass sequence:
//!
//! ```text
//! Idle -> Listing -> Fetching -> Extracting -> Done
//!   \________\__________\___________\-------> Failed
//! ```
//!
//! # Responsibilities
//! - List collections and documents, following `limit`/`offset` pagination
//!   until a short page comes back
//! - Fetch documents one at a time; nothing is requested concurrently
//! - Emit a collection's documents breadth-first by parentage
//! - Stop at the first error and hand it to the caller unchanged
//!
//! # Host page operations
//! [`OutlineDatasource::validate_credentials`], [`OutlineDatasource::get_pages`]
//! and [`OutlineDatasource::fetch_page`] back the host's credential form, page
//! picker and single-page preview.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use futures::Stream;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::contract::{
    Collection, Credential, Datasource, Document, DocumentSummary, ExtractedContent, Page,
    PageContent, PageIcon, PageKind, Rpc, Selection, WorkspaceInfo, WorkspacePages,
};
use crate::error::{CredentialError, RpcError};
use crate::extract::{extract, render_collection, render_document};
use crate::rpc::OutlineClient;
use crate::tree::breadth_first;

/// Batch size for list endpoints.
pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Largest `limit` Outline honours on list endpoints.
pub const MAX_PAGE_SIZE: usize = 100;
const DEFAULT_WORKSPACE_NAME: &str = "Outline Workspace";
const DEFAULT_COLLECTION_EMOJI: &str = "🔹";

pub struct OutlineDatasource<R = OutlineClient> {
    rpc: R,
    base_url: String,
    page_size: usize,
}

impl OutlineDatasource<OutlineClient> {
    pub fn new(credential: Credential) -> Self {
        let base_url = credential.base_url().to_string();
        Self::with_rpc(OutlineClient::new(credential), base_url)
    }
}

impl<R: Rpc> OutlineDatasource<R> {
    /// `base_url` is only used to build page links.
    pub fn with_rpc(rpc: R, base_url: impl Into<String>) -> Self {
        Self {
            rpc,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Clamped to `1..=MAX_PAGE_SIZE`; Outline never returns more per call.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        if page_size > MAX_PAGE_SIZE {
            warn!(page_size, max = MAX_PAGE_SIZE, "Page size above Outline's limit, clamping");
        }
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Calls `auth.info` to confirm the key and workspace URL work.
    pub async fn validate_credentials(&self) -> Result<(), CredentialError> {
        info!(workspace_url = %self.base_url, "Validating Outline credentials");
        match self.rpc.call("auth.info", json!({})).await {
            Ok(_) => {
                info!("Outline credentials accepted");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Outline credential validation failed");
                Err(e.into())
            }
        }
    }

    /// Team name and id from `auth.info`. Falls back to defaults on any error.
    pub async fn workspace_info(&self) -> WorkspaceInfo {
        let team = match self.rpc.call("auth.info", json!({})).await {
            Ok(data) => data.get("team").cloned().unwrap_or(Value::Null),
            Err(e) => {
                warn!(error = %e, "auth.info failed, using default workspace info");
                Value::Null
            }
        };
        let field = |name: &str| team.get(name).and_then(Value::as_str).map(str::to_string);
        WorkspaceInfo {
            workspace_name: field("name").unwrap_or_else(|| DEFAULT_WORKSPACE_NAME.to_string()),
            workspace_id: field("id").unwrap_or_default(),
            workspace_url: self.base_url.clone(),
        }
    }

    /// Every document in the workspace, across all collections.
    pub async fn list_all_documents(&self) -> Result<Vec<DocumentSummary>, RpcError> {
        self.paginate("documents.list", json!({})).await
    }

    /// `collections.info` plus the collection's document ids, parents first.
    pub async fn describe_collection(&self, collection_id: &str) -> Result<Collection, RpcError> {
        let mut collection: Collection = decode(
            "collections.info",
            self.rpc
                .call("collections.info", json!({ "id": collection_id }))
                .await?,
        )?;
        let documents = self.list_documents(collection_id).await?;
        collection.document_ids = breadth_first(documents).into_iter().map(|d| d.id).collect();
        Ok(collection)
    }

    /// One page of full-text search results.
    pub async fn search_documents(&self, query: &str) -> Result<Vec<DocumentSummary>, RpcError> {
        #[derive(Deserialize)]
        struct SearchHit {
            document: DocumentSummary,
        }

        let hits: Vec<SearchHit> = decode(
            "documents.search",
            self.rpc
                .call(
                    "documents.search",
                    json!({ "query": query, "limit": self.page_size, "offset": 0 }),
                )
                .await?,
        )?;
        info!(query = %query, count = hits.len(), "Search complete");
        Ok(hits.into_iter().map(|h| h.document).collect())
    }

    /// Workspace info plus every collection and document as selectable pages.
    pub async fn get_pages(&self) -> Result<WorkspacePages, RpcError> {
        let workspace = self.workspace_info().await;
        let collections = self.list_collections().await?;
        let documents = self.list_all_documents().await?;

        let mut pages = Vec::with_capacity(collections.len() + documents.len());
        for c in collections {
            pages.push(Page {
                url: format!("{}/collection/{}", self.base_url, c.id),
                page_icon: Some(PageIcon::emoji(
                    c.emoji.unwrap_or_else(|| DEFAULT_COLLECTION_EMOJI.to_string()),
                )),
                parent_id: None,
                kind: PageKind::Collection,
                last_edited_time: c.updated_at,
                page_id: c.id,
                page_name: c.name,
            });
        }
        for d in documents {
            let url = match d.url.as_deref() {
                Some(u) if u.starts_with('/') => format!("{}{}", self.base_url, u),
                Some(u) if !u.is_empty() => u.to_string(),
                _ => format!(
                    "{}/doc/{}",
                    self.base_url,
                    d.url_id.as_deref().unwrap_or(&d.id)
                ),
            };
            pages.push(Page {
                url,
                page_icon: d.emoji.map(PageIcon::emoji),
                parent_id: d
                    .parent_document_id
                    .filter(|p| !p.is_empty())
                    .or(d.collection_id),
                kind: PageKind::Document,
                last_edited_time: d.updated_at,
                page_id: d.id,
                page_name: d.title,
            });
        }

        info!(
            workspace = %workspace.workspace_name,
            pages = pages.len(),
            "Collected workspace pages"
        );
        Ok(WorkspacePages {
            total: pages.len(),
            workspace,
            pages,
        })
    }

    /// Renders one page as markdown. Collections inline all their documents.
    pub async fn fetch_page(&self, page_id: &str, kind: PageKind) -> Result<PageContent, RpcError> {
        info!(page_id = %page_id, kind = ?kind, "Fetching page content");
        match kind {
            PageKind::Document => {
                let document = self.fetch_document(page_id).await?;
                Ok(PageContent {
                    content: render_document(&document),
                    document_id: page_id.to_string(),
                    collection_id: String::new(),
                })
            }
            PageKind::Collection => {
                let collection: Collection = decode(
                    "collections.info",
                    self.rpc
                        .call("collections.info", json!({ "id": page_id }))
                        .await?,
                )?;
                let mut documents = Vec::new();
                for summary in breadth_first(self.list_documents(page_id).await?) {
                    documents.push(self.fetch_document(&summary.id).await?);
                }
                Ok(PageContent {
                    content: render_collection(&collection, &documents),
                    document_id: String::new(),
                    collection_id: page_id.to_string(),
                })
            }
        }
    }

    async fn paginate<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Vec<T>, RpcError> {
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let mut body = params.clone();
            body["limit"] = json!(self.page_size);
            body["offset"] = json!(offset);

            let batch: Vec<T> = decode(method, self.rpc.call(method, body).await?)?;
            let received = batch.len();
            items.extend(batch);
            debug!(method = %method, offset, received, "Fetched page");

            if received < self.page_size {
                break;
            }
            offset += received;
        }
        Ok(items)
    }
}

#[async_trait]
impl<R: Rpc> Datasource for OutlineDatasource<R> {
    async fn list_collections(&self) -> Result<Vec<Collection>, RpcError> {
        let collections: Vec<Collection> = self.paginate("collections.list", json!({})).await?;
        info!(count = collections.len(), "Listed collections");
        Ok(collections)
    }

    async fn list_documents(&self, collection_id: &str) -> Result<Vec<DocumentSummary>, RpcError> {
        let documents: Vec<DocumentSummary> = self
            .paginate("documents.list", json!({ "collectionId": collection_id }))
            .await?;
        info!(collection_id = %collection_id, count = documents.len(), "Listed documents");
        Ok(documents)
    }

    async fn fetch_document(&self, id: &str) -> Result<Document, RpcError> {
        let document: Document = decode(
            "documents.info",
            self.rpc.call("documents.info", json!({ "id": id })).await?,
        )?;
        debug!(document_id = %document.id, bytes = document.text.len(), "Fetched document");
        Ok(document)
    }

    fn run(&self, selection: Selection) -> ContentRun<'_> {
        ContentRun::new(self, selection)
    }
}

fn decode<T: DeserializeOwned>(method: &str, data: Value) -> Result<T, RpcError> {
    serde_json::from_value(data).map_err(|e| RpcError::InvalidResponse {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

/// Where a [`ContentRun`] currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Listing,
    Fetching,
    Extracting,
    Done,
    Failed,
}

enum Step {
    ListCollection(String),
    FetchDocument(String),
    FetchSelected(Vec<String>),
    Emit(Document),
}

/// Lazy, one-pass import of a [`Selection`].
///
/// Selected collections are expanded in order and each call to
/// [`ContentRun::next`] issues at most the requests needed for one of their
/// documents. Explicitly selected documents follow: they are fetched together
/// on the first call that reaches them, so that a selected child is held back
/// until its selected parent has been emitted. A document reached twice is
/// emitted once. After `Done` or `Failed` the run yields nothing; start a new
/// run to re-fetch.
pub struct ContentRun<'a> {
    source: &'a dyn Datasource,
    steps: VecDeque<Step>,
    seen: HashSet<String>,
    state: RunState,
    emitted: usize,
}

impl<'a> ContentRun<'a> {
    pub fn new(source: &'a dyn Datasource, selection: Selection) -> Self {
        let mut steps: VecDeque<Step> = selection
            .collections
            .into_iter()
            .map(Step::ListCollection)
            .collect();
        if !selection.documents.is_empty() {
            steps.push_back(Step::FetchSelected(selection.documents));
        }
        Self {
            source,
            steps,
            seen: HashSet::new(),
            state: RunState::Idle,
            emitted: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Number of items yielded so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Next extracted document, the error that ended the run, or `None`.
    pub async fn next(&mut self) -> Option<Result<ExtractedContent, RpcError>> {
        if matches!(self.state, RunState::Done | RunState::Failed) {
            return None;
        }
        if self.state == RunState::Idle {
            info!(steps = self.steps.len(), "[RUN] Starting import");
        }

        while let Some(step) = self.steps.pop_front() {
            match step {
                Step::ListCollection(collection_id) => {
                    self.state = RunState::Listing;
                    let documents = match self.source.list_documents(&collection_id).await {
                        Ok(docs) => docs,
                        Err(e) => return Some(self.fail(e)),
                    };
                    for doc in breadth_first(documents).into_iter().rev() {
                        self.steps.push_front(Step::FetchDocument(doc.id));
                    }
                }
                Step::FetchDocument(id) => {
                    if !self.seen.insert(id.clone()) {
                        debug!(document_id = %id, "[RUN] Skipping document already emitted");
                        continue;
                    }
                    self.state = RunState::Fetching;
                    let document = match self.source.fetch_document(&id).await {
                        Ok(doc) => doc,
                        Err(e) => return Some(self.fail(e)),
                    };
                    return Some(Ok(self.emit(&document)));
                }
                Step::FetchSelected(ids) => {
                    self.state = RunState::Fetching;
                    let mut fetched: Vec<Document> = Vec::with_capacity(ids.len());
                    for id in ids {
                        if self.seen.contains(&id) || fetched.iter().any(|d| d.id == id) {
                            debug!(document_id = %id, "[RUN] Skipping document already emitted");
                            continue;
                        }
                        match self.source.fetch_document(&id).await {
                            Ok(doc) => fetched.push(doc),
                            Err(e) => return Some(self.fail(e)),
                        }
                    }
                    for doc in breadth_first(fetched).into_iter().rev() {
                        self.steps.push_front(Step::Emit(doc));
                    }
                }
                Step::Emit(document) => {
                    if !self.seen.insert(document.id.clone()) {
                        debug!(document_id = %document.id, "[RUN] Skipping document already emitted");
                        continue;
                    }
                    return Some(Ok(self.emit(&document)));
                }
            }
        }

        self.state = RunState::Done;
        info!(emitted = self.emitted, "[RUN] Import complete");
        None
    }

    /// Drains the run, stopping at the first error.
    pub async fn try_collect(mut self) -> Result<Vec<ExtractedContent>, RpcError> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        Ok(items)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<ExtractedContent, RpcError>> + 'a {
        futures::stream::unfold(self, |mut run| async move {
            run.next().await.map(|item| (item, run))
        })
    }

    fn emit(&mut self, document: &Document) -> ExtractedContent {
        self.state = RunState::Extracting;
        let content = extract(document);
        self.emitted += 1;
        debug!(document_id = %document.id, title = %content.title, "[RUN] Emitting document");
        content
    }

    fn fail(&mut self, e: RpcError) -> Result<ExtractedContent, RpcError> {
        error!(error = %e, emitted = self.emitted, "[RUN][ERROR] Import aborted");
        self.state = RunState::Failed;
        self.steps.clear();
        Err(e)
    }
}
