/// Host harness for the Outline datasource.
///
/// Each subcommand mirrors one host call: credential validation, the page
/// picker, a single-page preview and a full import. Output is JSON on stdout;
/// logs go to stderr.
///
/// For programmatic/integration use: call [`run`] with a constructed [`Cli`].
use crate::contract::{Datasource, PageKind};
use crate::datasource::OutlineDatasource;
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(
    name = "outline-datasource",
    version,
    about = "Pull documents and collections out of an Outline workspace for LLM ingestion"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the API key and workspace URL against auth.info
    Validate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// List the workspace's collections and documents as selectable pages
    Pages {
        #[clap(long)]
        config: PathBuf,
    },
    /// Render a single collection or document as markdown
    Page {
        #[clap(long)]
        config: PathBuf,
        /// Collection or document id
        #[clap(long)]
        id: String,
        /// `collection` or `document`
        #[clap(long, default_value = "document")]
        kind: PageKind,
    },
    /// Import the configured selection, one JSON record per line
    Import {
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Validate { config } => {
            let datasource = build_datasource(&config)?;
            datasource.validate_credentials().await?;
            tracing::info!(command = "validate", "Credentials are valid");
            println!("{}", serde_json::json!({ "valid": true }));
        }
        Commands::Pages { config } => {
            let datasource = build_datasource(&config)?;
            let pages = datasource.get_pages().await?;
            tracing::info!(command = "pages", total = pages.total, "Listed pages");
            println!("{}", serde_json::to_string_pretty(&pages)?);
        }
        Commands::Page { config, id, kind } => {
            let datasource = build_datasource(&config)?;
            let page = datasource.fetch_page(&id, kind).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Commands::Import { config } => {
            let loaded = load_config(&config)?;
            let datasource =
                OutlineDatasource::new(loaded.credential()?).with_page_size(loaded.page_size);
            if loaded.selection.is_empty() {
                tracing::warn!(command = "import", "Selection is empty, nothing to import");
            }

            let mut import = datasource.run(loaded.selection);
            while let Some(item) = import.next().await {
                match item {
                    Ok(content) => println!("{}", serde_json::to_string(&content)?),
                    Err(e) => {
                        tracing::error!(command = "import", emitted = import.emitted(), error = %e, "Import failed");
                        return Err(e.into());
                    }
                }
            }
            tracing::info!(command = "import", emitted = import.emitted(), "Import complete");
        }
    }

    Ok(())
}

fn build_datasource(config: &std::path::Path) -> Result<OutlineDatasource> {
    let loaded = load_config(config)?;
    Ok(OutlineDatasource::new(loaded.credential()?).with_page_size(loaded.page_size))
}
