//! # Face Detection
//!
//! [`FaceDetector`] is the seam between the cropper and a concrete
//! detector. [`SeetaDetector`] runs the SeetaFace funnel-structured cascade
//! via `rustface`; tests substitute fixed region lists.

use std::path::Path;
use std::sync::Arc;

use crate::error::BiometricError;
use crate::raster::FaceRaster;

/// An axis-aligned rectangle in raster pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Finds candidate face regions in a raster. Order of the returned regions
/// is significant: it breaks selection ties.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, raster: &FaceRaster) -> Result<Vec<FaceRegion>, BiometricError>;
}

impl<D: FaceDetector + ?Sized> FaceDetector for Arc<D> {
    fn detect(&self, raster: &FaceRaster) -> Result<Vec<FaceRegion>, BiometricError> {
        (**self).detect(raster)
    }
}

impl<D: FaceDetector + ?Sized> FaceDetector for Box<D> {
    fn detect(&self, raster: &FaceRaster) -> Result<Vec<FaceRegion>, BiometricError> {
        (**self).detect(raster)
    }
}

/// A detector that always reports the given regions.
#[derive(Debug, Clone, Default)]
pub struct FixedRegions(pub Vec<FaceRegion>);

impl FaceDetector for FixedRegions {
    fn detect(&self, _raster: &FaceRaster) -> Result<Vec<FaceRegion>, BiometricError> {
        Ok(self.0.clone())
    }
}

/// SeetaFace detector backed by `rustface`.
///
/// The model is parsed once and shared read-only. Each call builds its own
/// detector around a copy so no mutable detector state crosses requests.
#[derive(Clone)]
pub struct SeetaDetector {
    model: Arc<rustface::Model>,
    min_face_size: u32,
}

impl SeetaDetector {
    /// Smallest face rustface will look for by default.
    pub const DEFAULT_MIN_FACE_SIZE: u32 = 20;

    pub fn from_model_bytes(model: Vec<u8>, min_face_size: u32) -> Result<Self, BiometricError> {
        let model = rustface::read_model(std::io::Cursor::new(model))
            .map_err(|e| BiometricError::Detection(format!("invalid face model: {e}")))?;
        Ok(Self {
            model: Arc::new(model),
            min_face_size,
        })
    }

    pub fn from_model_file(path: impl AsRef<Path>, min_face_size: u32) -> Result<Self, BiometricError> {
        let path = path.as_ref();
        let model = std::fs::read(path).map_err(|e| {
            BiometricError::Detection(format!("cannot read face model {}: {e}", path.display()))
        })?;
        Self::from_model_bytes(model, min_face_size)
    }
}

impl std::fmt::Debug for SeetaDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeetaDetector")
            .field("min_face_size", &self.min_face_size)
            .finish_non_exhaustive()
    }
}

impl FaceDetector for SeetaDetector {
    fn detect(&self, raster: &FaceRaster) -> Result<Vec<FaceRegion>, BiometricError> {
        let mut detector = rustface::create_detector_with_model(rustface::Model::clone(&self.model));
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let gray = raster.to_luma8();
        let (width, height) = gray.dimensions();
        let mut data = rustface::ImageData::new(gray.as_raw(), width, height);
        let regions = detector
            .detect(&mut data)
            .into_iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceRegion::new(
                    bbox.x().max(0) as u32,
                    bbox.y().max(0) as u32,
                    bbox.width(),
                    bbox.height(),
                )
            })
            .collect();
        Ok(regions)
    }
}
