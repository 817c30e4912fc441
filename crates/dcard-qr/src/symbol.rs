//! # Fixed-Version QR Symbols
//!
//! The symbol version is configured, never chosen from the payload size.
//! Data is placed in a single byte-mode segment, so the usable capacity of
//! a version/level pair is
//!
//! ```text
//! floor((data_bits - 4 - count_bits) / 8)
//! ```
//!
//! where `count_bits` is 8 for versions 1–9 and 16 for 10–40. Version 20
//! at level L holds 858 bytes. A payload one byte over capacity fails with
//! [`CodeGenerationError::CapacityExceeded`].

use dcard_core::CodePayload;
use qrcode::bits::Bits;
use qrcode::{Color, EcLevel, QrCode, Version};
use serde::{Deserialize, Serialize};

use crate::error::CodeGenerationError;
use crate::render;

/// QR error-correction level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCorrection {
    #[default]
    L,
    M,
    Q,
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(ec: ErrorCorrection) -> Self {
        match ec {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Symbol version, error correction, and rendering geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolSpec {
    /// QR version, 1–40.
    pub version: i16,
    pub error_correction: ErrorCorrection,
    /// Pixels per module in the rendered PNG.
    pub module_size: u32,
    /// Light border width, in modules.
    pub quiet_zone: u32,
}

impl Default for SymbolSpec {
    fn default() -> Self {
        Self {
            version: 20,
            error_correction: ErrorCorrection::L,
            module_size: 4,
            quiet_zone: 4,
        }
    }
}

/// Byte-mode capacity of a version at an error-correction level.
pub fn byte_capacity(version: i16, ec: ErrorCorrection) -> Result<usize, CodeGenerationError> {
    if !(1..=40).contains(&version) {
        return Err(CodeGenerationError::InvalidConfig(format!(
            "QR version must be 1-40, got {version}"
        )));
    }
    let data_bits = Bits::new(Version::Normal(version)).max_len(ec.into())?;
    let count_bits = if version <= 9 { 8 } else { 16 };
    Ok(data_bits.saturating_sub(4 + count_bits) / 8)
}

/// Encodes payload bytes into symbols of one fixed version.
#[derive(Debug, Clone)]
pub struct QrEncoder {
    spec: SymbolSpec,
    capacity: usize,
}

impl QrEncoder {
    pub fn new(spec: SymbolSpec) -> Result<Self, CodeGenerationError> {
        if spec.module_size == 0 {
            return Err(CodeGenerationError::InvalidConfig(
                "module size must be at least 1 pixel".into(),
            ));
        }
        let capacity = byte_capacity(spec.version, spec.error_correction)?;
        Ok(Self { spec, capacity })
    }

    pub fn spec(&self) -> &SymbolSpec {
        &self.spec
    }

    /// Largest payload, in bytes, this encoder accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Encode raw payload bytes.
    pub fn encode(&self, data: &[u8]) -> Result<QrSymbol, CodeGenerationError> {
        if data.len() > self.capacity {
            return Err(CodeGenerationError::CapacityExceeded {
                len: data.len(),
                capacity: self.capacity,
                version: self.spec.version,
            });
        }
        let ec: EcLevel = self.spec.error_correction.into();
        let mut bits = Bits::new(Version::Normal(self.spec.version));
        bits.push_byte_data(data)?;
        bits.push_terminator(ec)?;
        let code = QrCode::with_bits(bits, ec)?;
        tracing::debug!(
            len = data.len(),
            capacity = self.capacity,
            version = self.spec.version,
            "encoded QR symbol"
        );
        Ok(QrSymbol {
            width: code.width(),
            dark: code.to_colors().into_iter().map(|c| c == Color::Dark).collect(),
        })
    }

    /// Serialize a signed payload and encode it.
    pub fn encode_payload(&self, payload: &CodePayload) -> Result<QrSymbol, CodeGenerationError> {
        let bytes = payload
            .to_bytes()
            .map_err(|e| CodeGenerationError::Payload(e.to_string()))?;
        self.encode(&bytes)
    }

    /// Encode and render straight to PNG with this encoder's geometry.
    pub fn encode_png(&self, data: &[u8]) -> Result<Vec<u8>, CodeGenerationError> {
        self.encode(data)?.to_png(self.spec.module_size, self.spec.quiet_zone)
    }
}

/// An encoded symbol: a square grid of modules, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSymbol {
    width: usize,
    dark: Vec<bool>,
}

impl QrSymbol {
    /// Modules per side.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.dark.get(y * self.width + x).copied().unwrap_or(false)
    }

    /// Render to an 8-bit grayscale image.
    pub fn to_image(&self, module_size: u32, quiet_zone: u32) -> image::GrayImage {
        render::rasterize(self, module_size, quiet_zone)
    }

    pub fn to_png(&self, module_size: u32, quiet_zone: u32) -> Result<Vec<u8>, CodeGenerationError> {
        render::png(&self.to_image(module_size, quiet_zone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_capacities() {
        assert_eq!(byte_capacity(20, ErrorCorrection::L).unwrap(), 858);
        assert_eq!(byte_capacity(1, ErrorCorrection::L).unwrap(), 17);
        assert_eq!(byte_capacity(40, ErrorCorrection::L).unwrap(), 2953);
        assert_eq!(byte_capacity(10, ErrorCorrection::M).unwrap(), 213);
    }

    #[test]
    fn version_out_of_range_rejected() {
        assert!(byte_capacity(0, ErrorCorrection::L).is_err());
        assert!(byte_capacity(41, ErrorCorrection::L).is_err());
        let spec = SymbolSpec {
            module_size: 0,
            ..SymbolSpec::default()
        };
        assert!(matches!(QrEncoder::new(spec), Err(CodeGenerationError::InvalidConfig(_))));
    }

    #[test]
    fn version_is_fixed_not_adaptive() {
        let encoder = QrEncoder::new(SymbolSpec::default()).unwrap();
        // Version 20 is 97 modules wide regardless of payload size.
        assert_eq!(encoder.encode(b"x").unwrap().width(), 97);
        assert_eq!(encoder.encode(&[b'y'; 800]).unwrap().width(), 97);
    }

    #[test]
    fn capacity_boundary_small_version() {
        let encoder = QrEncoder::new(SymbolSpec {
            version: 1,
            ..SymbolSpec::default()
        })
        .unwrap();
        assert!(encoder.encode(&[b'a'; 16]).is_ok());
        assert!(encoder.encode(&[b'a'; 17]).is_ok());
        assert!(matches!(
            encoder.encode(&[b'a'; 18]),
            Err(CodeGenerationError::CapacityExceeded { len: 18, capacity: 17, version: 1 })
        ));
    }

    #[test]
    fn error_correction_serde() {
        let spec: SymbolSpec = serde_json::from_str(r#"{"error_correction":"M"}"#).unwrap();
        assert_eq!(spec.error_correction, ErrorCorrection::M);
        assert_eq!(spec.version, 20);
    }
}
