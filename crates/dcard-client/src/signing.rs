//! Typed client for the remote document-signing service.
//!
//! Wraps the key manager's PDF signing endpoint:
//!
//! ```text
//! POST {sign_url}
//! {"id":"mosip.kernel.pdf.sign","version":"1.0","requesttime":"..Z",
//!  "request":{"data":<b64>,"lowerLeftX":..,"lowerLeftY":..,"upperRightX":..,
//!             "upperRightY":..,"reason":..,"pageNumber":1,"password":..,
//!             "applicationId":"KERNEL","referenceId":"SIGN","timeStamp":"..Z"}}
//! ```
//!
//! The response carries `response.data` (base64 signed document) and an
//! `errors` list. A non-empty list is a rejection, even on HTTP 200.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ServiceApiError;

const REQUEST_ID: &str = "mosip.kernel.pdf.sign";
const REQUEST_VERSION: &str = "1.0";
const APPLICATION_ID: &str = "KERNEL";
const REFERENCE_ID: &str = "SIGN";

/// Timestamp layout expected by the key manager.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Page rectangle in PDF user-space units where the signature appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureBox {
    pub lower_left_x: i32,
    pub lower_left_y: i32,
    pub upper_right_x: i32,
    pub upper_right_y: i32,
}

impl Default for SignatureBox {
    fn default() -> Self {
        Self {
            lower_left_x: 73,
            lower_left_y: 100,
            upper_right_x: 300,
            upper_right_y: 150,
        }
    }
}

/// What to sign and how.
#[derive(Debug, Clone)]
pub struct SignDocumentRequest {
    pub document: Vec<u8>,
    pub signature_box: SignatureBox,
    pub reason: String,
    pub page_number: u32,
    pub password: Option<String>,
}

// -- Wire types ---------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RequestWrapper<'a> {
    id: &'static str,
    version: &'static str,
    requesttime: String,
    request: PdfSignRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PdfSignRequest<'a> {
    data: String,
    lower_left_x: i32,
    lower_left_y: i32,
    upper_right_x: i32,
    upper_right_y: i32,
    reason: &'a str,
    page_number: u32,
    password: &'a str,
    application_id: &'static str,
    reference_id: &'static str,
    time_stamp: String,
}

#[derive(Debug, Deserialize)]
struct ResponseWrapper {
    #[serde(default)]
    response: Option<SignatureResponse>,
    #[serde(default)]
    errors: Option<Vec<ServiceError>>,
}

#[derive(Debug, Deserialize)]
struct SignatureResponse {
    data: Option<String>,
}

/// One entry of the service's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    pub error_code: String,
    pub message: String,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

// -- Client -------------------------------------------------------------------

/// Client for the remote PDF signing service.
#[derive(Debug, Clone)]
pub struct DocumentSigningClient {
    http: reqwest::Client,
    url: Url,
}

impl DocumentSigningClient {
    pub(crate) fn new(http: reqwest::Client, url: Url) -> Self {
        Self { http, url }
    }

    /// Submit a rendered document for signing and return the signed bytes.
    pub async fn sign(&self, req: &SignDocumentRequest) -> Result<Vec<u8>, ServiceApiError> {
        let endpoint = format!("POST {}", self.url.path());
        let now = timestamp(Utc::now());
        let body = RequestWrapper {
            id: REQUEST_ID,
            version: REQUEST_VERSION,
            requesttime: now.clone(),
            request: PdfSignRequest {
                data: STANDARD.encode(&req.document),
                lower_left_x: req.signature_box.lower_left_x,
                lower_left_y: req.signature_box.lower_left_y,
                upper_right_x: req.signature_box.upper_right_x,
                upper_right_y: req.signature_box.upper_right_y,
                reason: &req.reason,
                page_number: req.page_number,
                password: req.password.as_deref().unwrap_or_default(),
                application_id: APPLICATION_ID,
                reference_id: REFERENCE_ID,
                time_stamp: now,
            },
        };

        let resp = crate::retry::retry_send(&endpoint, || {
            self.http.post(self.url.clone()).json(&body).send()
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

        let wrapper: ResponseWrapper =
            resp.json().await.map_err(|e| ServiceApiError::Deserialization {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if let Some(first) = wrapper.errors.as_ref().and_then(|errs| errs.first()) {
            return Err(ServiceApiError::Remote {
                endpoint,
                code: first.error_code.clone(),
                message: first.message.clone(),
            });
        }

        let data = wrapper
            .response
            .and_then(|r| r.data)
            .ok_or_else(|| ServiceApiError::InvalidResponse {
                endpoint: endpoint.clone(),
                message: "response carries no signed data".into(),
            })?;
        STANDARD
            .decode(data.trim())
            .map_err(|e| ServiceApiError::InvalidResponse {
                endpoint,
                message: format!("signed data is not base64: {e}"),
            })
    }
}
