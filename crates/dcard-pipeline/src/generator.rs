//! # Card Generator
//!
//! Composes the card offline, renders it through the template renderer, and
//! has the document-signing service sign the result.
//!
//! Degraded elements (photo, thumbnail, code signature, code, mapping) never
//! abort a request. A missing identity, a failed render, and any failure of
//! the document-signing call do.

use std::sync::Arc;

use dcard_biometric::{FaceDetector, SeetaDetector};
use dcard_client::{ServiceClient, SignDocumentRequest};
use dcard_core::IdentityRecord;
use dcard_crypto::KeyProvider;
use tracing::Instrument;

use crate::collaborators::{DocumentSigner, TemplateRenderer};
use crate::composer::{CardComposer, ComposedCard, CredentialType};
use crate::config::{CardConfig, ConfigError};
use crate::degradation::Degradation;
use crate::error::PipelineError;
use crate::mapping::MappingSource;

/// A signed card document and everything it was rendered without.
#[derive(Debug, Clone)]
pub struct GeneratedCard {
    pub document: Vec<u8>,
    pub degradations: Vec<Degradation>,
}

impl GeneratedCard {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// Generates signed card documents.
#[derive(Debug)]
pub struct CardGenerator<D, R, S> {
    composer: CardComposer<D>,
    renderer: R,
    signer: S,
}

impl<D, R, S> CardGenerator<D, R, S> {
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }
}

impl<D, R, S> CardGenerator<D, R, S>
where
    D: FaceDetector,
    R: TemplateRenderer,
    S: DocumentSigner,
{
    pub fn new(composer: CardComposer<D>, renderer: R, signer: S) -> Self {
        Self {
            composer,
            renderer,
            signer,
        }
    }

    pub fn composer(&self) -> &CardComposer<D> {
        &self.composer
    }


    /// Generate a signed card for one record.
    ///
    /// `password` protects the signed document when the signing service
    /// supports it.
    pub async fn generate(
        &self,
        record: &IdentityRecord,
        credential_type: CredentialType,
        password: Option<&str>,
    ) -> Result<GeneratedCard, PipelineError> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("card_request", %request_id, ?credential_type);
        self.generate_inner(record, credential_type, password)
            .instrument(span)
            .await
    }

    async fn generate_inner(
        &self,
        record: &IdentityRecord,
        credential_type: CredentialType,
        password: Option<&str>,
    ) -> Result<GeneratedCard, PipelineError> {
        let ComposedCard {
            attributes,
            degradations,
            code,
            ..
        } = self.composer.compose(record, credential_type)?;
        let config = self.composer.config();

        let rendered = self
            .renderer
            .render(&config.template_type_code, &config.template_language, &attributes)
            .await
            .map_err(PipelineError::Render)?;
        tracing::debug!(bytes = rendered.len(), "card template rendered");

        let request = SignDocumentRequest {
            document: rendered,
            signature_box: config.signature_box,
            reason: config.signature_reason.clone(),
            page_number: config.signature_page,
            password: password.map(str::to_string),
        };
        let document = self
            .signer
            .sign_document(&request)
            .await
            .map_err(PipelineError::from_signing)?;

        tracing::info!(
            bytes = document.len(),
            degradations = degradations.len(),
            payload_digest = code.as_ref().map(|c| c.digest.to_string()).as_deref(),
            "card generated"
        );
        Ok(GeneratedCard {
            document,
            degradations,
        })
    }
}

/// Generator wired to the HTTP collaborators.
pub type HttpCardGenerator = CardGenerator<SeetaDetector, dcard_client::TemplateClient, dcard_client::DocumentSigningClient>;

/// Build the offline composer named by `config`: loads the face model and
/// points the mapping at `mapping_path`.
pub fn composer_from_config(
    config: CardConfig,
    keys: Arc<dyn KeyProvider>,
) -> Result<CardComposer<SeetaDetector>, ConfigError> {
    let detector = config
        .face_model_path
        .as_deref()
        .map(|path| SeetaDetector::from_model_file(path, config.min_face_size))
        .transpose()?;
    let mapping = config
        .mapping_path
        .clone()
        .map(MappingSource::File)
        .unwrap_or_default();
    CardComposer::new(config, keys, detector, mapping)
}

/// Build a generator from configuration, splitting `client` into its two
/// collaborators.
pub fn http_generator(
    config: CardConfig,
    keys: Arc<dyn KeyProvider>,
    client: ServiceClient,
) -> Result<HttpCardGenerator, ConfigError> {
    let composer = composer_from_config(config, keys)?;
    Ok(CardGenerator::new(
        composer,
        client.templates().clone(),
        client.signing().clone(),
    ))
}
