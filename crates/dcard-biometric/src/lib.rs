//! # dcard-biometric — Face Extraction and Thumbnailing
//!
//! Stages one and two of the card pipeline:
//!
//! 1. [`extract_face_raster`]: parse the CBEFF container from the identity
//!    record, find the `Face` sample, decode its ISO/IEC 19794-5 record, and
//!    decode the embedded image into a [`FaceRaster`].
//! 2. [`FaceCropper`]: detect faces, select the primary region, crop,
//!    grayscale, resize, and encode a WebP [`Thumbnail`] under a byte budget.
//!
//! Nothing here is fatal to a card request. A missing face sample is
//! `Ok(None)`, an empty detection is [`FaceOutcome::Absent`], and every
//! processing failure is reported as a value for the orchestrator to log.

pub mod cbeff;
pub mod detect;
pub mod error;
pub mod extract;
pub mod face;
pub mod iso19794;
pub mod raster;

pub use cbeff::{BiometricContainer, BiometricEntry, BirBuilder, FACE_MODALITY};
pub use detect::{FaceDetector, FaceRegion, FixedRegions, SeetaDetector};
pub use error::BiometricError;
pub use extract::extract_face_raster;
pub use face::{select_region, CropConvention, FaceCropper, FaceOutcome, Thumbnail, ThumbnailSpec};
pub use iso19794::{FaceImageRecord, ImageDataType, IsoVersion};
pub use raster::FaceRaster;
