//! # CBEFF Biometric Container
//!
//! Parses the XML Common Biometric Exchange Formats Framework wrapper
//! (ISO/IEC 19785-3) that carries an identity's biometric samples:
//!
//! ```text
//! <BIR xmlns="http://standards.iso.org/iso-iec/19785/-3/ed-2/">
//!   <BIRInfo>..</BIRInfo>
//!   <BIR>
//!     <BDBInfo>
//!       <Format><Organization>Mosip</Organization><Type>8</Type></Format>
//!       <Type>Face</Type>
//!       <Subtype></Subtype>
//!     </BDBInfo>
//!     <BDB>base64url sample</BDB>
//!   </BIR>
//! </BIR>
//! ```
//!
//! Only `BDBInfo/Type` names the modality; the `Type` nested in `Format` is
//! a format code and is ignored. Entries without a `BDB` are skipped.
//!
//! The container string found in an identity record is either the raw XML
//! or its base64/base64url encoding.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::BiometricError;

/// Modality tag of face samples.
pub const FACE_MODALITY: &str = "Face";

const CBEFF_NAMESPACE: &str = "http://standards.iso.org/iso-iec/19785/-3/ed-2/";

/// One biometric sample from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiometricEntry {
    /// `Face`, `Finger`, `Iris`, ...
    pub modality: String,
    /// Whitespace-separated tokens of `BDBInfo/Subtype`, e.g. `["Left", "Thumb"]`.
    pub subtypes: Vec<String>,
    /// Decoded `BDB` bytes (for faces, an ISO/IEC 19794-5 record).
    pub data: Vec<u8>,
}

impl BiometricEntry {
    /// Whether this entry matches a modality and subtype filter. An empty
    /// filter matches every subtype.
    pub fn matches(&self, modality: &str, subtypes: &[String]) -> bool {
        self.modality == modality && (subtypes.is_empty() || self.subtypes == subtypes)
    }
}

/// A parsed CBEFF container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BiometricContainer {
    entries: Vec<BiometricEntry>,
}

impl BiometricContainer {
    /// Parse a container string as found in an identity record.
    pub fn parse(container: &str) -> Result<Self, BiometricError> {
        let trimmed = container.trim();
        if trimmed.starts_with('<') {
            return Self::parse_xml(trimmed);
        }
        let bytes = decode_lenient_base64(trimmed)
            .map_err(|e| BiometricError::Container(format!("container is neither XML nor base64: {e}")))?;
        let xml = std::str::from_utf8(&bytes)
            .map_err(|e| BiometricError::Container(format!("container is not UTF-8: {e}")))?;
        Self::parse_xml(xml.trim())
    }

    /// Parse the XML form.
    pub fn parse_xml(xml: &str) -> Result<Self, BiometricError> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut open: Vec<PendingEntry> = Vec::new();
        let mut entries = Vec::new();
        let mut saw_bir = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    if name == "BIR" {
                        saw_bir = true;
                        open.push(PendingEntry::default());
                    }
                    path.push(name);
                }
                Ok(Event::End(_)) => {
                    if path.pop().as_deref() == Some("BIR") {
                        if let Some(entry) = open.pop().and_then(PendingEntry::finish).transpose()? {
                            entries.push(entry);
                        }
                    }
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| BiometricError::Container(e.to_string()))?;
                    if let Some(entry) = open.last_mut() {
                        entry.absorb(&path, &text);
                    }
                }
                Ok(Event::CData(c)) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    if let Some(entry) = open.last_mut() {
                        entry.absorb(&path, &text);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(BiometricError::Container(format!(
                        "XML error at byte {}: {e}",
                        reader.buffer_position()
                    )))
                }
            }
            buf.clear();
        }

        if !saw_bir {
            return Err(BiometricError::Container("no BIR element".into()));
        }
        if !path.is_empty() {
            return Err(BiometricError::Container("unterminated BIR element".into()));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[BiometricEntry] {
        &self.entries
    }

    /// The first sample matching `modality` and the subtype filter.
    pub fn find(&self, modality: &str, subtypes: &[String]) -> Option<&BiometricEntry> {
        self.entries.iter().find(|e| e.matches(modality, subtypes))
    }

    /// The first face sample matching the subtype filter.
    pub fn face_sample(&self, subtypes: &[String]) -> Option<&[u8]> {
        self.find(FACE_MODALITY, subtypes).map(|e| e.data.as_slice())
    }
}

#[derive(Default)]
struct PendingEntry {
    modality: String,
    subtypes: String,
    bdb: String,
}

impl PendingEntry {
    fn absorb(&mut self, path: &[String], text: &str) {
        let tail: Vec<&str> = path.iter().rev().take(2).map(String::as_str).collect();
        match tail.as_slice() {
            ["Type", "BDBInfo"] => self.modality.push_str(text),
            ["Subtype", "BDBInfo"] => self.subtypes.push_str(text),
            ["BDB", ..] => self.bdb.push_str(text),
            _ => {}
        }
    }

    fn finish(self) -> Option<Result<BiometricEntry, BiometricError>> {
        let bdb = self.bdb.trim();
        if bdb.is_empty() {
            return None;
        }
        Some(
            decode_lenient_base64(bdb)
                .map(|data| BiometricEntry {
                    modality: self.modality.trim().to_string(),
                    subtypes: self.subtypes.split_whitespace().map(str::to_string).collect(),
                    data,
                })
                .map_err(|e| BiometricError::Container(format!("BDB is not base64: {e}"))),
        )
    }
}

/// Decode base64 in either alphabet, with or without padding and with
/// embedded line breaks.
pub fn decode_lenient_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .collect();
    if cleaned.contains(['+', '/']) {
        STANDARD_NO_PAD.decode(cleaned)
    } else {
        URL_SAFE_NO_PAD.decode(cleaned)
    }
}

/// Writes CBEFF containers for tooling and test fixtures.
#[derive(Debug, Default, Clone)]
pub struct BirBuilder {
    entries: Vec<BiometricEntry>,
}

impl BirBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a face sample with no subtype.
    pub fn face(self, data: Vec<u8>) -> Self {
        self.sample(FACE_MODALITY, &[], data)
    }

    pub fn sample(mut self, modality: &str, subtypes: &[&str], data: Vec<u8>) -> Self {
        self.entries.push(BiometricEntry {
            modality: modality.to_string(),
            subtypes: subtypes.iter().map(|s| s.to_string()).collect(),
            data,
        });
        self
    }

    /// Render the XML form, with `BDB` in unpadded base64url.
    pub fn to_xml(&self) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <BIR xmlns=\"{CBEFF_NAMESPACE}\"><BIRInfo><Integrity>false</Integrity></BIRInfo>"
        );
        for entry in &self.entries {
            xml.push_str(&format!(
                "<BIR><Version><Major>1</Major><Minor>1</Minor></Version>\
                 <BDBInfo><Format><Organization>Mosip</Organization><Type>8</Type></Format>\
                 <Type>{}</Type><Subtype>{}</Subtype><Level>Raw</Level><Purpose>Enroll</Purpose></BDBInfo>\
                 <BDB>{}</BDB></BIR>",
                quick_xml::escape::escape(entry.modality.as_str()),
                quick_xml::escape::escape(entry.subtypes.join(" ").as_str()),
                URL_SAFE_NO_PAD.encode(&entry.data),
            ));
        }
        xml.push_str("</BIR>");
        xml
    }

    /// Render the base64 form stored in identity records.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_xml())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_face_and_ignores_format_type() {
        let xml = BirBuilder::new()
            .sample("Finger", &["Left", "Thumb"], vec![9, 9])
            .face(vec![1, 2, 3])
            .to_xml();
        let container = BiometricContainer::parse(&xml).unwrap();
        assert_eq!(container.entries().len(), 2);
        assert_eq!(container.entries()[0].modality, "Finger");
        assert_eq!(container.entries()[0].subtypes, vec!["Left", "Thumb"]);
        assert_eq!(container.face_sample(&[]), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn base64_container_accepted() {
        let builder = BirBuilder::new().face(vec![0xff; 40]);
        let container = BiometricContainer::parse(&builder.to_base64()).unwrap();
        assert_eq!(container.face_sample(&[]).map(<[u8]>::len), Some(40));
    }

    #[test]
    fn subtype_filter() {
        let xml = BirBuilder::new()
            .sample("Face", &["Left"], vec![1])
            .sample("Face", &["Right"], vec![2])
            .to_xml();
        let container = BiometricContainer::parse(&xml).unwrap();
        assert_eq!(container.face_sample(&["Right".to_string()]), Some(&[2u8][..]));
        assert_eq!(container.face_sample(&[]), Some(&[1u8][..]));
        assert_eq!(container.face_sample(&["Top".to_string()]), None);
    }

    #[test]
    fn no_face_entry_is_none() {
        let xml = BirBuilder::new().sample("Iris", &["Left"], vec![1]).to_xml();
        let container = BiometricContainer::parse(&xml).unwrap();
        assert_eq!(container.face_sample(&[]), None);
    }

    #[test]
    fn malformed_containers_fail() {
        assert!(matches!(
            BiometricContainer::parse("<BIR><BDBInfo></BIR>"),
            Err(BiometricError::Container(_))
        ));
        assert!(matches!(
            BiometricContainer::parse("%%% not a container %%%"),
            Err(BiometricError::Container(_))
        ));
        assert!(matches!(
            BiometricContainer::parse("<Other/>"),
            Err(BiometricError::Container(msg)) if msg.contains("no BIR")
        ));
        assert!(BiometricContainer::parse("<BIR><BIR><BDB>@@@</BDB></BIR></BIR>").is_err());
    }

    #[test]
    fn lenient_base64_alphabets() {
        assert_eq!(decode_lenient_base64("+/8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_lenient_base64("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_lenient_base64("AQID\nBA==").unwrap(), vec![1, 2, 3, 4]);
    }
}
