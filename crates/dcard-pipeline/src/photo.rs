//! Applicant photo stage: record biometrics → face raster → PNG data URI.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dcard_biometric::{extract_face_raster, BiometricError, FaceRaster};
use dcard_core::IdentityRecord;

/// Prefix of every image attribute handed to the template renderer.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Result of looking for the applicant photo. Owned by one request.
#[derive(Debug)]
pub enum PhotoOutcome {
    Present(FaceRaster),
    /// The record has no biometrics, or no face sample in them.
    Absent(&'static str),
    Failed(BiometricError),
}

/// Extract the applicant's face raster from the record's biometrics.
pub fn extract_photo(record: &IdentityRecord, subtypes: &[String]) -> PhotoOutcome {
    let Some(container) = record.biometrics() else {
        return PhotoOutcome::Absent("record carries no biometrics");
    };
    match extract_face_raster(container, subtypes) {
        Ok(Some(raster)) => PhotoOutcome::Present(raster),
        Ok(None) => PhotoOutcome::Absent("biometrics contain no face sample"),
        Err(e) => PhotoOutcome::Failed(e),
    }
}

/// Encode bytes as a `data:image/png;base64,` URI.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("{PNG_DATA_URI_PREFIX}{}", STANDARD.encode(png))
}
