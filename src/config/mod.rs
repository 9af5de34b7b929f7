mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, path::Path};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Environment variables checked for the Gemini credential, in order.
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Loads `.env`, the optional YAML file and environment overrides.
///
/// Fails when no API key ends up configured.
pub async fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

    let config = match env::var("CONFIG_PATH") {
        Ok(path) => read_file(&path).await?,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            read_file(DEFAULT_CONFIG_PATH).await?
        }
        Err(_) => {
            debug!("No configuration file found, using defaults");
            Config::default()
        }
    };

    resolve(config, |key| env::var(key).ok())
}

async fn read_file(path: &str) -> Result<Config> {
    debug!("Loading configuration from: {}", path);

    let config_str = tokio::fs::read_to_string(path).await?;
    from_yaml(&config_str)
}

pub fn from_yaml(source: &str) -> Result<Config> {
    // An empty file deserializes to unit, not to a defaulted struct.
    if source.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(source)?)
}

/// Applies environment overrides and checks the result.
pub fn resolve(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let env_key = API_KEY_VARS
        .iter()
        .filter_map(|&var| lookup(var))
        .find(|value| !value.trim().is_empty());
    if let Some(key) = env_key {
        config.llm.api_key = Some(key);
    }

    let has_key = config
        .llm
        .api_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty());
    if !has_key {
        return Err(Error::config(
            "No API key found. Set GOOGLE_API_KEY or GEMINI_API_KEY in .env or environment variables.",
        ));
    }

    if config.llm.text_model.trim().is_empty() || config.llm.image_model.trim().is_empty() {
        return Err(Error::config("Model identifiers must not be empty"));
    }

    Ok(config)
}
