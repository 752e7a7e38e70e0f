use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, trace};

use crate::dirs::config_dir;

pub trait StoredConfig
where
    Self: DeserializeOwned,
{
    fn kind() -> &'static str;

    /// This config's preferred file name exluding the extension.
    fn default_name() -> &'static str {
        Self::kind()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Load the config from its default location in the config dir.
///
/// Returns `None` if no such file exists.
pub async fn get<C: StoredConfig>() -> Result<Option<C>, ConfigError> {
    debug!("reading {} config", C::kind());
    get_with_name(config_dir(), C::default_name()).await
}

/// Load and decode a config stored with `name` under `dir`.
///
/// `name` is the file name without an extension, all stored configs
/// automatically get a `.json` extension.
pub async fn get_with_name<C: StoredConfig, P: AsRef<Path>>(
    dir: P,
    name: &str,
) -> Result<Option<C>, ConfigError> {
    let full_path = dir.as_ref().join(name).with_extension("json");
    trace!("reading {}", full_path.display());

    match fs::read_to_string(&full_path).await {
        Ok(contents) => {
            let config = serde_json::from_str::<C>(&contents)?;
            Ok(Some(config))
        }
        Err(err) => match err.kind() {
            // We don't have a saved config
            io::ErrorKind::NotFound => Ok(None),

            // We have a config but failed to load it
            _ => Err(err.into()),
        },
    }
}

/// Load and decode a config from an explicit file path.
///
/// Unlike [`get_with_name`], a missing file is an error as the user
/// asked for it.
pub async fn read_from_path<C: StoredConfig, P: AsRef<Path>>(path: P) -> Result<C, ConfigError> {
    debug!("reading {} config from {}", C::kind(), path.as_ref().display());
    let contents = fs::read_to_string(path.as_ref()).await?;
    let config = serde_json::from_str::<C>(&contents)?;
    Ok(config)
}
