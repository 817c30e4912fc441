//! # dcard-qr — Optical-Code Encoder
//!
//! Encodes the signed card payload into a QR symbol of a fixed, configured
//! version. The payload is placed as one byte-mode segment; if it does not
//! fit, encoding fails with [`CodeGenerationError::CapacityExceeded`] and
//! nothing is truncated. Symbols render to PNG for the card template.

pub mod error;
mod render;
pub mod symbol;

pub use error::CodeGenerationError;
pub use symbol::{byte_capacity, ErrorCorrection, QrEncoder, QrSymbol, SymbolSpec};
