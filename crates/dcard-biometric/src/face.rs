//! # Face Locator and Cropper
//!
//! Turns a [`FaceRaster`] into the small grayscale WebP thumbnail embedded
//! in the card payload.
//!
//! ## Region selection
//!
//! With several candidate regions, the one whose **top-left corner** is
//! nearest (Euclidean) to the raster centre `(width / 2, height / 2)` wins,
//! using integer halves. This is a heuristic that assumes the subject is
//! centred; it does not identify the subject. Equal distances go to the
//! region the detector reported first.
//!
//! ## Crop conventions
//!
//! - [`CropConvention::ExactBox`] crops the detector box itself, clamped to
//!   the raster.
//! - [`CropConvention::LegacyExtended`] crops a rectangle at `(x, y)` of size
//!   `(x + width, y + height)`, reproducing cards issued by the earlier
//!   service. It covers more than the detected box and fails if it leaves
//!   the raster.

use image::imageops::{self, FilterType};
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::detect::{FaceDetector, FaceRegion};
use crate::error::BiometricError;
use crate::raster::FaceRaster;

/// How a detected region maps to the cropped rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropConvention {
    #[default]
    ExactBox,
    LegacyExtended,
}

impl CropConvention {
    /// The rectangle to crop for `region` in a `width` x `height` raster.
    pub fn crop_rect(self, region: FaceRegion, width: u32, height: u32) -> Result<FaceRegion, BiometricError> {
        match self {
            Self::ExactBox => {
                let x0 = region.x.min(width);
                let y0 = region.y.min(height);
                let x1 = region.x.saturating_add(region.width).min(width);
                let y1 = region.y.saturating_add(region.height).min(height);
                if x1 <= x0 || y1 <= y0 {
                    return Err(BiometricError::Crop(format!(
                        "region {region:?} has no overlap with {width}x{height} raster"
                    )));
                }
                Ok(FaceRegion::new(x0, y0, x1 - x0, y1 - y0))
            }
            Self::LegacyExtended => {
                let rect = FaceRegion::new(
                    region.x,
                    region.y,
                    region.x.saturating_add(region.width),
                    region.y.saturating_add(region.height),
                );
                let fits = rect.width > 0
                    && rect.height > 0
                    && rect.x.checked_add(rect.width).is_some_and(|r| r <= width)
                    && rect.y.checked_add(rect.height).is_some_and(|b| b <= height);
                if !fits {
                    return Err(BiometricError::Crop(format!(
                        "extended rectangle {rect:?} leaves {width}x{height} raster"
                    )));
                }
                Ok(rect)
            }
        }
    }
}

/// Pick the primary face among candidates. `None` when there are none.
pub fn select_region(regions: &[FaceRegion], width: u32, height: u32) -> Option<FaceRegion> {
    let cx = i64::from(width / 2);
    let cy = i64::from(height / 2);
    // Squared distance orders exactly like the Euclidean distance and stays
    // in integers, so equal distances compare equal.
    let distance_sq = |r: &FaceRegion| {
        let dx = i64::from(r.x) - cx;
        let dy = i64::from(r.y) - cy;
        dx * dx + dy * dy
    };

    let mut best: Option<(FaceRegion, i64)> = None;
    for region in regions {
        let d = distance_sq(region);
        // Strict comparison keeps the earliest region on ties.
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((*region, d));
        }
    }
    best.map(|(region, _)| region)
}

/// Thumbnail geometry, quality, and size budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
    /// WebP quality, 0–100.
    pub quality: f32,
    /// Largest encoded thumbnail accepted, in bytes. The default leaves room
    /// for a typical subject block in a version 20-L symbol.
    pub max_bytes: usize,
    pub crop_convention: CropConvention,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            width: 45,
            height: 58,
            quality: 30.0,
            max_bytes: 450,
            crop_convention: CropConvention::ExactBox,
        }
    }
}

/// An encoded face thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Result of the face stage. "No face found" and "face processing failed"
/// are distinct; both leave the card without a thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceOutcome {
    Present(Thumbnail),
    Absent,
    Failed(String),
}

impl FaceOutcome {
    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        match self {
            Self::Present(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_thumbnail(self) -> Option<Thumbnail> {
        match self {
            Self::Present(t) => Some(t),
            _ => None,
        }
    }
}

/// Detects, selects, crops, and encodes the face thumbnail.
#[derive(Debug, Clone)]
pub struct FaceCropper<D> {
    detector: D,
    spec: ThumbnailSpec,
}

impl<D: FaceDetector> FaceCropper<D> {
    pub fn new(detector: D, spec: ThumbnailSpec) -> Self {
        Self { detector, spec }
    }

    pub fn spec(&self) -> &ThumbnailSpec {
        &self.spec
    }

    /// Detect and select a region, returning the rectangle to crop.
    pub fn locate(&self, raster: &FaceRaster) -> Result<Option<FaceRegion>, BiometricError> {
        let regions = self.detector.detect(raster)?;
        tracing::debug!(candidates = regions.len(), "face detection finished");
        select_region(&regions, raster.width(), raster.height())
            .map(|region| {
                self.spec
                    .crop_convention
                    .crop_rect(region, raster.width(), raster.height())
            })
            .transpose()
    }

    /// Crop `rect` out of the grayscale raster.
    pub fn crop(&self, raster: &FaceRaster, rect: FaceRegion) -> GrayImage {
        imageops::crop_imm(&raster.to_luma8(), rect.x, rect.y, rect.width, rect.height).to_image()
    }

    /// Resize a crop and encode it as lossy WebP within the byte budget.
    pub fn encode(&self, face: &GrayImage) -> Result<Thumbnail, BiometricError> {
        let (w, h) = (self.spec.width, self.spec.height);
        let small = imageops::resize(face, w, h, FilterType::Triangle);
        // The WebP encoder takes RGB; equal channels keep it grayscale.
        let rgb: Vec<u8> = small.as_raw().iter().flat_map(|&v| [v, v, v]).collect();
        let encoded = webp::Encoder::from_rgb(&rgb, w, h)
            .encode_simple(false, self.spec.quality)
            .map_err(|e| BiometricError::Thumbnail(format!("WebP encoder: {e:?}")))?;
        if encoded.len() > self.spec.max_bytes {
            return Err(BiometricError::Thumbnail(format!(
                "{} bytes exceeds budget of {}",
                encoded.len(),
                self.spec.max_bytes
            )));
        }
        Ok(Thumbnail {
            bytes: encoded.to_vec(),
            width: w,
            height: h,
        })
    }

    /// Run the whole face stage. Never fails: errors become
    /// [`FaceOutcome::Failed`].
    pub fn thumbnail(&self, raster: &FaceRaster) -> FaceOutcome {
        let rect = match self.locate(raster) {
            Ok(Some(rect)) => rect,
            Ok(None) => return FaceOutcome::Absent,
            Err(e) => return FaceOutcome::Failed(e.to_string()),
        };
        match self.encode(&self.crop(raster, rect)) {
            Ok(thumbnail) => FaceOutcome::Present(thumbnail),
            Err(e) => FaceOutcome::Failed(e.to_string()),
        }
    }
}
