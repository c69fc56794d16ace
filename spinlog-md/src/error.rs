//! Error types for spinlog-md

use crate::services::CatalogError;
use thiserror::Error;

/// Metadata engine error type
#[derive(Debug, Error)]
pub enum MdError {
    /// Remote catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// spinlog-common error (database, config, I/O)
    #[error("Common error: {0}")]
    Common(#[from] spinlog_common::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for metadata engine operations
pub type MdResult<T> = Result<T, MdError>;
