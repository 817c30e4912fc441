//! # dcard-pipeline — Card Generation Orchestrator
//!
//! Turns a decrypted identity record into a signed card document:
//!
//! 1. extract the applicant photo from the record's biometrics;
//! 2. crop a face thumbnail from it;
//! 3. read the subject block and build the canonical card payload;
//! 4. sign the canonical bytes;
//! 5. encode payload and signature into a fixed-version QR symbol;
//! 6. render the template and have the document signed remotely.
//!
//! Stages 1–5 run in [`CardComposer`] without I/O beyond configuration
//! files. [`CardGenerator`] adds the two remote calls.
//!
//! ## Failure policy
//!
//! | Failure | Effect |
//! |---------|--------|
//! | malformed biometrics, no face, thumbnail too large | card without photo / thumbnail |
//! | signing key unavailable | code without `si` |
//! | subject field missing, payload over capacity | card without code |
//! | mapping unreadable | card without mapped attributes |
//! | record missing, render failure, document signing failure | request fails |

pub mod code;
pub mod collaborators;
pub mod composer;
pub mod config;
pub mod degradation;
pub mod error;
pub mod generator;
pub mod mapping;
pub mod photo;
pub mod subject;

pub use code::{sign_card_payload, verify_code_payload, SignedCode, VerifyError};
pub use collaborators::{DocumentSigner, TemplateRenderer};
pub use composer::{CardComposer, CodeArtifact, ComposedCard, CredentialType};
pub use config::{CardConfig, ConfigError, SubjectFields};
pub use degradation::Degradation;
pub use error::PipelineError;
pub use generator::{composer_from_config, http_generator, CardGenerator, GeneratedCard, HttpCardGenerator};
pub use mapping::{build_attributes, FieldMapping, MappingConfigError, MappingSource};
pub use subject::{SubjectError, SubjectExtractor};
