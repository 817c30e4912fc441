//! Collaborator service error types.

/// Errors from the template renderer and document-signing calls.
#[derive(Debug, thiserror::Error)]
pub enum ServiceApiError {
    /// HTTP transport error, after retries.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The service answered 2xx with an explicit error list.
    #[error("{endpoint} reported error {code}: {message}")]
    Remote {
        endpoint: String,
        code: String,
        message: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response was well-formed but unusable (missing or undecodable data).
    #[error("invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl ServiceApiError {
    /// Whether the remote service itself rejected the request, as opposed to
    /// the request never completing.
    pub fn is_remote_rejection(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::ApiError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_display_carries_service_detail() {
        let err = ServiceApiError::Remote {
            endpoint: "POST /pdf/sign".into(),
            code: "KER-KMS-012".into(),
            message: "certificate expired".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("KER-KMS-012"));
        assert!(msg.contains("certificate expired"));
        assert!(err.is_remote_rejection());
    }
}
