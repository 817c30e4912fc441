//! Seams to the services the pipeline calls but does not implement.
//!
//! The HTTP clients from `dcard-client` implement both traits; tests supply
//! in-process fakes.

use std::future::Future;

use dcard_client::{DocumentSigningClient, ServiceApiError, SignDocumentRequest, TemplateClient};
use serde_json::{Map, Value};

/// Renders the card template with the composed attributes.
pub trait TemplateRenderer: Send + Sync {
    fn render(
        &self,
        template_code: &str,
        language: &str,
        attributes: &Map<String, Value>,
    ) -> impl Future<Output = Result<Vec<u8>, ServiceApiError>> + Send;
}

/// Applies the document-level signature to a rendered card.
pub trait DocumentSigner: Send + Sync {
    fn sign_document(
        &self,
        request: &SignDocumentRequest,
    ) -> impl Future<Output = Result<Vec<u8>, ServiceApiError>> + Send;
}

impl TemplateRenderer for TemplateClient {
    fn render(
        &self,
        template_code: &str,
        language: &str,
        attributes: &Map<String, Value>,
    ) -> impl Future<Output = Result<Vec<u8>, ServiceApiError>> + Send {
        TemplateClient::render(self, template_code, language, attributes)
    }
}

impl DocumentSigner for DocumentSigningClient {
    fn sign_document(
        &self,
        request: &SignDocumentRequest,
    ) -> impl Future<Output = Result<Vec<u8>, ServiceApiError>> + Send {
        self.sign(request)
    }
}
