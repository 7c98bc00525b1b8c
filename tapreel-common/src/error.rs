//! Errors raised while reading and validating configuration

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The config file exists but could not be read
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Parsed, but unusable for a presentation
    #[error("Invalid config: {0}")]
    Config(String),
}
