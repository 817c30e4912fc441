//! # Pipeline Error Types
//!
//! Only the failures that abort a card request live here. Everything the
//! pipeline can degrade around is reported as a
//! [`Degradation`](crate::Degradation) instead.

use dcard_client::ServiceApiError;
use dcard_core::RecordError;
use thiserror::Error;

use crate::config::ConfigError;

/// A card request failed and produced no document.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The record is missing, empty, or carries no UIN.
    #[error("identity not found: {0}")]
    IdentityNotFound(String),

    /// The record is present but unusable.
    #[error("malformed identity record: {0}")]
    MalformedRecord(String),

    /// The mapping configuration could not be read and nothing else was
    /// left to render.
    #[error("attribute set is empty: {0}")]
    EmptyAttributes(String),

    /// The template renderer produced no document.
    #[error("template rendering failed: {0}")]
    Render(#[source] ServiceApiError),

    /// The document-signing service rejected the document.
    #[error("remote signing rejected the document: {code}: {message}")]
    RemoteSigning { code: String, message: String },

    /// The document-signing service could not be reached or answered
    /// outside its contract.
    #[error("remote signing failed: {0}")]
    SigningService(#[source] ServiceApiError),

    /// The pipeline configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<RecordError> for PipelineError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::IdentityNotFound(msg) => Self::IdentityNotFound(msg),
            RecordError::Malformed(msg) => Self::MalformedRecord(msg),
        }
    }
}

impl PipelineError {
    /// Classify a document-signing failure. An explicit error list from the
    /// service keeps its code and message.
    pub fn from_signing(e: ServiceApiError) -> Self {
        match e {
            ServiceApiError::Remote { code, message, .. } => Self::RemoteSigning { code, message },
            other => Self::SigningService(other),
        }
    }
}
