/// `load_config` module: loads a static YAML config and injects the API key from the environment.
///
/// The YAML file never carries secrets. It names the workspace URL, an optional
/// list page size and the selection to import:
///
/// ```yaml
/// workspace_url: https://team.getoutline.com
/// page_size: 100
/// selection:
///   collections: [C1]
///   documents: []
/// ```
///
/// The API key is read from `OUTLINE_API_KEY` (a `.env` file works too, the
/// binary loads it through `dotenvy` before calling in here). `page_size` is
/// clamped to Outline's list limit of 100.
///
/// # Errors
/// All failures are `anyhow::Error`s naming the file or variable involved.
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::{DatasourceConfig, API_KEY_ENV};
use crate::datasource::MAX_PAGE_SIZE;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DatasourceConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: DatasourceConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if !(1..=MAX_PAGE_SIZE).contains(&config.page_size) {
        warn!(
            page_size = config.page_size,
            max = MAX_PAGE_SIZE,
            "page_size outside Outline's limits, clamping"
        );
        config.page_size = config.page_size.clamp(1, MAX_PAGE_SIZE);
    }

    config.api_key = match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Some(key),
        _ => {
            error!(env = API_KEY_ENV, "API key missing in environment");
            return Err(anyhow::anyhow!("{API_KEY_ENV} missing in environment"));
        }
    };

    config.trace_loaded();
    Ok(config)
}
