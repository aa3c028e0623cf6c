#![doc = "outline-datasource: fetch-and-format adapter for Outline workspaces."]

//! Pulls collections and documents out of an Outline knowledge base through
//! its RPC-style API (`POST /api/<method>`) and hands plain-text records to a
//! host ingestion pipeline.
//!
//! Layers, leaves first:
//! - [`transport`]: one authenticated JSON POST
//! - [`rpc`]: `call(method, params)`, envelope unwrapping, error mapping
//! - [`extract`]: markdown to plain text, page rendering
//! - [`tree`]: parent-before-child ordering
//! - [`datasource`]: the coordinator and its lazy [`datasource::ContentRun`]
//!
//! The seams between them live in [`contract`].

pub mod cli;
pub mod config;
pub mod contract;
pub mod datasource;
pub mod error;
pub mod extract;
pub mod load_config;
pub mod rpc;
pub mod transport;
pub mod tree;

pub use cli::{run, Cli, Commands};
pub use contract::{
    Collection, Credential, Datasource, Document, DocumentSummary, ExtractedContent, PageKind,
    Selection,
};
pub use datasource::{ContentRun, OutlineDatasource, RunState};
pub use error::{CredentialError, RpcError};
