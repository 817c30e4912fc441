//! Request-scoped decoded face image.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat};

use crate::error::BiometricError;

/// A decoded face image. Produced once per request and never cached.
#[derive(Debug, Clone)]
pub struct FaceRaster {
    image: DynamicImage,
}

impl FaceRaster {
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Decode an encoded image, sniffing its format.
    pub fn decode(bytes: &[u8]) -> Result<Self, BiometricError> {
        Ok(Self::from_image(image::load_from_memory(bytes)?))
    }

    pub fn decode_with_format(bytes: &[u8], format: ImageFormat) -> Result<Self, BiometricError> {
        Ok(Self::from_image(image::load_from_memory_with_format(bytes, format)?))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Single-channel copy used for detection and cropping.
    pub fn to_luma8(&self) -> GrayImage {
        self.image.to_luma8()
    }

    /// Re-encode as PNG for the applicant photo on the card.
    pub fn to_png(&self) -> Result<Vec<u8>, BiometricError> {
        let mut out = Cursor::new(Vec::new());
        self.image.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn png_roundtrip_keeps_dimensions() {
        let img = RgbImage::from_fn(20, 30, |x, y| Rgb([x as u8, y as u8, 128]));
        let raster = FaceRaster::from_image(DynamicImage::ImageRgb8(img));
        let png = raster.to_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let back = FaceRaster::decode(&png).unwrap();
        assert_eq!((back.width(), back.height()), (20, 30));
        assert_eq!(back.to_luma8().dimensions(), (20, 30));
    }

    #[test]
    fn garbage_is_raster_error() {
        assert!(matches!(
            FaceRaster::decode(b"definitely not an image"),
            Err(BiometricError::Raster(_))
        ));
    }
}
