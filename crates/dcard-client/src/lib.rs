//! # dcard-client — Collaborator Service Clients
//!
//! Typed async access to the two services the card pipeline depends on but
//! does not implement:
//!
//! - **Template renderer**: turns the card attribute map into a document.
//! - **Document signer**: applies the document-level signature to the
//!   rendered output and returns the signed bytes.
//!
//! Transport failures are retried with exponential backoff. A signing
//! response with a non-empty `errors` list surfaces as
//! [`ServiceApiError::Remote`] carrying the service's code and message.

pub mod config;
pub mod error;
pub mod render;
pub(crate) mod retry;
pub mod signing;

pub use config::{ConfigError, ServiceConfig};
pub use error::ServiceApiError;
pub use render::TemplateClient;
pub use signing::{DocumentSigningClient, ServiceError, SignDocumentRequest, SignatureBox};

use std::time::Duration;

/// Holds one client per collaborator over a shared connection pool.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    templates: TemplateClient,
    signing: DocumentSigningClient,
}

impl ServiceClient {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceApiError> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(token) = &config.api_token {
            let mut headers = reqwest::header::HeaderMap::new();
            let mut value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ServiceApiError::Config(ConfigError::InvalidToken))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }
        let http = builder.build().map_err(|e| ServiceApiError::Http {
            endpoint: "client_init".into(),
            source: e,
        })?;

        Ok(Self {
            templates: TemplateClient::new(http.clone(), config.render_url),
            signing: DocumentSigningClient::new(http, config.sign_url),
        })
    }

    pub fn templates(&self) -> &TemplateClient {
        &self.templates
    }

    pub fn signing(&self) -> &DocumentSigningClient {
        &self.signing
    }
}
