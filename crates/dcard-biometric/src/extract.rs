//! Face sample extraction: container string → ISO record → raster.

use crate::cbeff::BiometricContainer;
use crate::error::BiometricError;
use crate::iso19794::FaceImageRecord;
use crate::raster::FaceRaster;

/// Extract the face raster from a biometric container string.
///
/// Returns `Ok(None)` when the container holds no face sample matching
/// `subtypes` (an empty filter matches any). Malformed containers, records,
/// and images are errors.
pub fn extract_face_raster(
    container: &str,
    subtypes: &[String],
) -> Result<Option<FaceRaster>, BiometricError> {
    let container = BiometricContainer::parse(container)?;
    let Some(sample) = container.face_sample(subtypes) else {
        tracing::debug!(entries = container.entries().len(), "container has no face sample");
        return Ok(None);
    };
    let record = FaceImageRecord::parse(sample)?;
    tracing::debug!(
        version = ?record.version,
        image_type = ?record.image_data_type,
        width = record.width,
        height = record.height,
        "decoded face record"
    );
    record.decode_raster().map(Some)
}
