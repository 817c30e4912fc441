//! # dcard-core — Foundational Types for the Card Pipeline
//!
//! This crate is the leaf of the `dcard-*` workspace. It owns the data model
//! that every other stage agrees on:
//!
//! - [`IdentityRecord`]: the decrypted identity record handed to the pipeline.
//! - [`CardPayload`]: the fixed-schema record that is signed.
//! - [`CodePayload`]: the same record plus its signature, as embedded in the
//!   optical code.
//! - [`CanonicalBytes`]: the only byte sequence that may be signed or verified.
//!
//! ## Key Design Principles
//!
//! 1. **One serializer.** Signed bytes and displayed bytes come from the same
//!    `serde` definitions. `CodePayload` serializes as the `CardPayload` fields
//!    followed by `si`, so stripping the signature and re-serializing yields
//!    the signed bytes exactly.
//!
//! 2. **Typed scalars at the boundary.** Subject fields are read from the
//!    record as typed values (strings, `{value}` objects, localized arrays).
//!    The bracket-stripping of the upstream `toString()` form lives in
//!    [`legacy`] and is applied only as a compatibility shim.
//!
//! 3. **No ambient state.** Every type here is an owned value threaded through
//!    the call chain; nothing is cached across requests.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dcard-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod legacy;
pub mod payload;
pub mod record;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, RecordError};
pub use payload::{CardPayload, CodePayload, SexCode, SubjectBlock, DEFAULT_ISSUER};
pub use record::{IdentityRecord, LocalizedValue, BIOMETRICS_KEY, UIN_KEY};
