//! Typed errors for configuration and plugin resolution
//!
//! Build and command flows use `anyhow::Result`; these are the errors a caller
//! may want to match on.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read site config {path:?}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse site config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown plugin `{0}`")]
    UnknownPlugin(String),

    #[error("unknown remark plugin `{0}` in transformer-remark")]
    UnknownRemarkPlugin(String),

    #[error("invalid options for plugin `{name}`: {source}")]
    InvalidPluginOptions {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
}
