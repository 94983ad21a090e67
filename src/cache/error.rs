//! Errors surfaced by the cache facade.

use thiserror::Error;

use crate::cache::compressor::CompressionError;
use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Entry {key:?} is {size} bytes, larger than the cache capacity of {max} bytes")]
    EntryTooLarge { key: String, size: usize, max: usize },

    #[error("Compression of {key:?} failed: {source}")]
    Compression {
        key: String,
        #[source]
        source: CompressionError,
    },

    #[error("Hook {hook} failed: {message}")]
    Hook { hook: &'static str, message: String },

    #[error("Warming {key:?} failed: {message}")]
    Warming { key: String, message: String },

    #[error("Metrics registration failed: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Maintenance tasks need a running tokio runtime")]
    NoRuntime,

    #[error("Cache has been shut down")]
    ShutDown,
}

impl CacheError {
    pub(crate) fn hook(hook: &'static str, err: anyhow::Error) -> Self {
        CacheError::Hook {
            hook,
            message: format!("{err:#}"),
        }
    }
}
