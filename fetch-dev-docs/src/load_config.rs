/// `load_config` module: loads a static YAML config and injects secrets from the environment.
///
/// This module is the only place where user-supplied YAML is parsed into the core
/// [`FetchConfig`]. Every section is optional; anything left out keeps the
/// defaults for mirroring the LangQuest repository.
///
/// # Responsibilities
/// - Parse the YAML config file into [`FetchConfig`]
/// - Inject `GITHUB_TOKEN` from the environment (secrets never live in the file)
/// - Surface clear diagnostics for the CLI: any failure names the file and the cause
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use fetch_dev_docs_core::config::FetchConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Environment variable holding the optional API token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Loads a YAML config file (no secrets) and injects the API token from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FetchConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config = if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        FetchConfig::default()
    } else {
        match serde_yaml::from_str::<FetchConfig>(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    Ok(with_env_secrets(config))
}

/// Default configuration with secrets from the environment, for runs without a config file.
pub fn default_config() -> FetchConfig {
    info!("No config file given, using built-in defaults");
    with_env_secrets(FetchConfig::default())
}

fn with_env_secrets(mut config: FetchConfig) -> FetchConfig {
    config.token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty());
    info!(token_set = config.token.is_some(), "{TOKEN_ENV} read from environment");
    config
}
