//! # ISO/IEC 19794-5 Face Image Records
//!
//! Reads and writes the face image data interchange format carried in a
//! CBEFF `BDB`. Two layouts exist in the field:
//!
//! - **2005** (`FAC\0` `010\0`): 14-byte general header; per image a 20-byte
//!   facial information block, 8-byte feature points, a 12-byte image
//!   information block, then the image bytes up to the block length.
//! - **2011** (`FAC\0` `030\0`): 17-byte general header; per representation
//!   a capture/quality header, a 17-byte facial information block, 8-byte
//!   landmark points, an 11-byte image information block, and a 4-byte
//!   image data length followed by the image bytes.
//!
//! All integers are big-endian. Only the first image of a record is read.

use crate::error::BiometricError;
use crate::raster::FaceRaster;

const FORMAT_ID: &[u8; 4] = b"FAC\0";

/// Face record layout version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoVersion {
    /// ISO/IEC 19794-5:2005, version `010`.
    V2005,
    /// ISO/IEC 19794-5:2011, version `030`.
    V2011,
}

impl IsoVersion {
    fn tag(self) -> &'static [u8; 4] {
        match self {
            Self::V2005 => b"010\0",
            Self::V2011 => b"030\0",
        }
    }
}

/// Encoding of the embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageDataType {
    Jpeg,
    Jpeg2000Lossy,
    Jpeg2000Lossless,
    Png,
}

impl ImageDataType {
    pub fn from_code(code: u8) -> Result<Self, BiometricError> {
        match code {
            0 => Ok(Self::Jpeg),
            1 => Ok(Self::Jpeg2000Lossy),
            2 => Ok(Self::Jpeg2000Lossless),
            3 => Ok(Self::Png),
            other => Err(BiometricError::UnsupportedImageType(other)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Jpeg => 0,
            Self::Jpeg2000Lossy => 1,
            Self::Jpeg2000Lossless => 2,
            Self::Png => 3,
        }
    }
}

/// The first face image of an ISO/IEC 19794-5 record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceImageRecord {
    pub version: IsoVersion,
    pub image_data_type: ImageDataType,
    pub width: u16,
    pub height: u16,
    /// The encoded image (JPEG, JPEG 2000, or PNG bytes).
    pub image: Vec<u8>,
}

impl FaceImageRecord {
    /// Parse a record.
    pub fn parse(bytes: &[u8]) -> Result<Self, BiometricError> {
        let mut cur = Cursor::new(bytes);
        if cur.take(4)? != FORMAT_ID {
            return Err(BiometricError::FaceRecord("missing FAC format identifier".into()));
        }
        let version = match cur.take(4)? {
            b"010\0" => IsoVersion::V2005,
            b"030\0" => IsoVersion::V2011,
            other => {
                return Err(BiometricError::FaceRecord(format!(
                    "unknown version {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        };
        let record_length = cur.u32()? as usize;
        if record_length > bytes.len() {
            return Err(BiometricError::FaceRecord(format!(
                "record length {record_length} exceeds {} available bytes",
                bytes.len()
            )));
        }
        let images = cur.u16()?;
        if images == 0 {
            return Err(BiometricError::FaceRecord("record holds no face image".into()));
        }
        match version {
            IsoVersion::V2005 => Self::parse_2005(&mut cur),
            IsoVersion::V2011 => {
                cur.skip(3)?; // certification flag, temporal semantics
                Self::parse_2011(&mut cur)
            }
        }
    }

    fn parse_2005(cur: &mut Cursor<'_>) -> Result<Self, BiometricError> {
        let block_start = cur.pos;
        let block_length = cur.u32()? as usize;
        let points = cur.u16()? as usize;
        cur.skip(14)?; // gender .. pose angle uncertainty
        cur.skip(points * 8)?;
        let (image_data_type, width, height) = Self::read_image_info(cur)?;
        cur.skip(6)?; // colour space, source type, device type, quality
        let image_end = block_start
            .checked_add(block_length)
            .filter(|end| *end >= cur.pos)
            .ok_or_else(|| BiometricError::FaceRecord("facial block length too small".into()))?;
        let image = cur.take(image_end - cur.pos)?.to_vec();
        Ok(Self {
            version: IsoVersion::V2005,
            image_data_type,
            width,
            height,
            image,
        })
    }

    fn parse_2011(cur: &mut Cursor<'_>) -> Result<Self, BiometricError> {
        cur.skip(4)?; // representation length
        cur.skip(9 + 1 + 2 + 2)?; // capture date/time, device technology/vendor/type
        let quality_blocks = cur.u8()? as usize;
        cur.skip(quality_blocks * 5)?;
        let landmarks = cur.u16()? as usize;
        cur.skip(15)?; // gender .. pose angle uncertainty, subject height included
        cur.skip(landmarks * 8)?;
        let (image_data_type, width, height) = Self::read_image_info(cur)?;
        cur.skip(5)?; // spatial sampling, post-acquisition, cross reference, colour space
        let length = cur.u32()? as usize;
        let image = cur.take(length)?.to_vec();
        Ok(Self {
            version: IsoVersion::V2011,
            image_data_type,
            width,
            height,
            image,
        })
    }

    fn read_image_info(cur: &mut Cursor<'_>) -> Result<(ImageDataType, u16, u16), BiometricError> {
        cur.skip(1)?; // face image type
        let data_type = ImageDataType::from_code(cur.u8()?)?;
        let width = cur.u16()?;
        let height = cur.u16()?;
        Ok((data_type, width, height))
    }

    /// Build a single-image record around an encoded image.
    pub fn new(version: IsoVersion, image_data_type: ImageDataType, width: u16, height: u16, image: Vec<u8>) -> Self {
        Self {
            version,
            image_data_type,
            width,
            height,
            image,
        }
    }

    /// Serialize in this record's layout. Descriptive fields are written as
    /// zero ("unspecified").
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();
        match self.version {
            IsoVersion::V2005 => {
                let block_length = 20 + 12 + self.image.len();
                body.extend_from_slice(&(block_length as u32).to_be_bytes());
                body.extend_from_slice(&0u16.to_be_bytes()); // feature points
                body.extend_from_slice(&[0; 14]);
                self.write_image_info(&mut body);
                body.extend_from_slice(&[0; 6]);
                body.extend_from_slice(&self.image);
            }
            IsoVersion::V2011 => {
                let representation_length = 4 + 14 + 1 + 17 + 11 + 4 + self.image.len();
                body.extend_from_slice(&(representation_length as u32).to_be_bytes());
                body.extend_from_slice(&[0; 14]);
                body.push(0); // quality blocks
                body.extend_from_slice(&0u16.to_be_bytes()); // landmark points
                body.extend_from_slice(&[0; 15]);
                self.write_image_info(&mut body);
                body.extend_from_slice(&[0; 5]);
                body.extend_from_slice(&(self.image.len() as u32).to_be_bytes());
                body.extend_from_slice(&self.image);
            }
        }

        let header_length = match self.version {
            IsoVersion::V2005 => 14,
            IsoVersion::V2011 => 17,
        };
        let mut out = Vec::with_capacity(header_length + body.len());
        out.extend_from_slice(FORMAT_ID);
        out.extend_from_slice(self.version.tag());
        out.extend_from_slice(&((header_length + body.len()) as u32).to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        if self.version == IsoVersion::V2011 {
            out.extend_from_slice(&[0; 3]);
        }
        out.extend_from_slice(&body);
        out
    }

    fn write_image_info(&self, out: &mut Vec<u8>) {
        out.push(0); // basic face image
        out.push(self.image_data_type.code());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
    }

    /// Decode the embedded image into a raster. JPEG 2000 is not supported.
    pub fn decode_raster(&self) -> Result<FaceRaster, BiometricError> {
        let format = match self.image_data_type {
            ImageDataType::Jpeg => image::ImageFormat::Jpeg,
            ImageDataType::Png => image::ImageFormat::Png,
            other => return Err(BiometricError::UnsupportedImageType(other.code())),
        };
        FaceRaster::decode_with_format(&self.image, format)
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], BiometricError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                BiometricError::FaceRecord(format!(
                    "truncated: need {n} bytes at offset {}, have {}",
                    self.pos,
                    self.bytes.len().saturating_sub(self.pos)
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<(), BiometricError> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, BiometricError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, BiometricError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, BiometricError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::GrayImage::from_fn(width, height, |x, y| image::Luma([((x + y) * 7) as u8]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn roundtrip_2011_png() {
        let image = png(12, 16);
        let record = FaceImageRecord::new(IsoVersion::V2011, ImageDataType::Png, 12, 16, image.clone());
        let parsed = FaceImageRecord::parse(&record.to_bytes()).unwrap();
        assert_eq!(parsed, record);
        let raster = parsed.decode_raster().unwrap();
        assert_eq!((raster.width(), raster.height()), (12, 16));
    }

    /// A 2011 record laid out field by field, with descriptive fields set.
    fn standard_2011_record(image: &[u8], width: u16, height: u16) -> Vec<u8> {
        let mut representation = Vec::new();
        representation.extend_from_slice(&[0x07, 0xE3, 3, 30, 9, 15, 0, 0, 0]); // capture date/time
        representation.push(1); // capture device technology
        representation.extend_from_slice(&[0x00, 0x2A, 0x00, 0x07]); // vendor, device type
        representation.push(1); // quality blocks
        representation.extend_from_slice(&[60, 0x01, 0x01, 0x00, 0x01]);
        representation.extend_from_slice(&1u16.to_be_bytes()); // landmark points
        representation.push(2); // gender
        representation.push(3); // eye colour
        representation.push(4); // hair colour
        representation.push(170); // subject height
        representation.extend_from_slice(&[0x00, 0x00, 0x03]); // property mask
        representation.extend_from_slice(&[0x00, 0x01]); // expression
        representation.extend_from_slice(&[0, 0, 0]); // pose angle
        representation.extend_from_slice(&[5, 5, 5]); // pose angle uncertainty
        representation.extend_from_slice(&[0x05, 0x01, 0x00, 0x14, 0x00, 0x1E, 0x00, 0x00]);
        representation.push(1); // face image type: full frontal
        representation.push(3); // PNG
        representation.extend_from_slice(&width.to_be_bytes());
        representation.extend_from_slice(&height.to_be_bytes());
        representation.push(0); // spatial sampling rate
        representation.extend_from_slice(&[0, 0]); // post-acquisition processing
        representation.push(0); // cross reference
        representation.push(1); // colour space
        representation.extend_from_slice(&(image.len() as u32).to_be_bytes());
        representation.extend_from_slice(image);

        let mut out = Vec::new();
        out.extend_from_slice(b"FAC\0030\0");
        out.extend_from_slice(&((17 + 4 + representation.len()) as u32).to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&[0, 0, 0]);
        out.extend_from_slice(&((4 + representation.len()) as u32).to_be_bytes());
        out.extend_from_slice(&representation);
        out
    }

    #[test]
    fn parses_field_by_field_2011_record() {
        let image = png(12, 16);
        let parsed = FaceImageRecord::parse(&standard_2011_record(&image, 12, 16)).unwrap();
        assert_eq!(
            (parsed.image_data_type, parsed.width, parsed.height, parsed.image.len()),
            (ImageDataType::Png, 12, 16, image.len())
        );
        assert_eq!(parsed.image, image);
    }

    #[test]
    fn writer_emits_17_byte_facial_block() {
        let image = png(8, 8);
        let written = FaceImageRecord::new(IsoVersion::V2011, ImageDataType::Png, 8, 8, image.clone()).to_bytes();
        // general header 17, representation header 4 + 14 + 1, facial block 17, image info 11, length 4
        assert_eq!(written.len(), 17 + 19 + 17 + 11 + 4 + image.len());
        assert_eq!(written[17 + 19 + 17 + 1], ImageDataType::Png.code());
    }

    #[test]
    fn roundtrip_2005_png() {
        let record = FaceImageRecord::new(IsoVersion::V2005, ImageDataType::Png, 8, 8, png(8, 8));
        let bytes = record.to_bytes();
        assert_eq!(&bytes[4..8], b"010\0");
        assert_eq!(FaceImageRecord::parse(&bytes).unwrap(), record);
    }

    #[test]
    fn record_length_header_matches() {
        let bytes = FaceImageRecord::new(IsoVersion::V2011, ImageDataType::Png, 8, 8, png(8, 8)).to_bytes();
        let declared = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        assert_eq!(declared, bytes.len());
    }

    #[test]
    fn jpeg2000_is_unsupported() {
        let record = FaceImageRecord::new(IsoVersion::V2011, ImageDataType::Jpeg2000Lossy, 8, 8, vec![0; 10]);
        let parsed = FaceImageRecord::parse(&record.to_bytes()).unwrap();
        assert!(matches!(
            parsed.decode_raster(),
            Err(BiometricError::UnsupportedImageType(1))
        ));
    }

    #[test]
    fn truncated_and_foreign_records_rejected() {
        let bytes = FaceImageRecord::new(IsoVersion::V2011, ImageDataType::Png, 8, 8, png(8, 8)).to_bytes();
        assert!(FaceImageRecord::parse(&bytes[..bytes.len() - 5]).is_err());
        assert!(FaceImageRecord::parse(b"FIR\0010\0").is_err());
        assert!(FaceImageRecord::parse(b"FAC\0099\0\0\0\0\x0e\0\x01").is_err());
        assert!(FaceImageRecord::parse(&[]).is_err());
    }

    #[test]
    fn unknown_image_data_type_rejected() {
        let mut bytes = FaceImageRecord::new(IsoVersion::V2005, ImageDataType::Png, 8, 8, png(8, 8)).to_bytes();
        // header 14 + facial info 20 + face image type 1
        bytes[14 + 20 + 1] = 9;
        assert!(matches!(
            FaceImageRecord::parse(&bytes),
            Err(BiometricError::UnsupportedImageType(9))
        ));
    }
}
