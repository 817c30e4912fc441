//! Typed client for the template renderer.
//!
//! `POST {render_url}/templates/{templateTypeCode}/render?lang={code}` with
//! the attribute map as the JSON body. The response body is the rendered
//! document.

use serde_json::{Map, Value};
use url::Url;

use crate::error::ServiceApiError;

/// Client for the template-rendering service.
#[derive(Debug, Clone)]
pub struct TemplateClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TemplateClient {
    pub(crate) fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn render_url(&self, template_code: &str, language: &str) -> Result<Url, ServiceApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceApiError::InvalidResponse {
                endpoint: "render".into(),
                message: format!("render URL {} cannot be a base", self.base_url),
            })?
            .pop_if_empty()
            .extend(["templates", template_code, "render"]);
        url.query_pairs_mut().append_pair("lang", language);
        Ok(url)
    }

    /// Render a template with the given attributes.
    pub async fn render(
        &self,
        template_code: &str,
        language: &str,
        attributes: &Map<String, Value>,
    ) -> Result<Vec<u8>, ServiceApiError> {
        let endpoint = format!("POST /templates/{template_code}/render");
        let url = self.render_url(template_code, language)?;

        let resp = crate::retry::retry_send(&endpoint, || {
            self.http.post(url.clone()).json(attributes).send()
        })
        .await
        .map_err(|e| ServiceApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceApiError::ApiError {
                endpoint,
                status,
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| ServiceApiError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        if bytes.is_empty() {
            return Err(ServiceApiError::InvalidResponse {
                endpoint,
                message: "empty document".into(),
            });
        }
        tracing::debug!(template = template_code, len = bytes.len(), "template rendered");
        Ok(bytes.to_vec())
    }
}
