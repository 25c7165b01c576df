//! Sample database (SDB) container format.
//!
//! An SDB file stores labeled audio samples behind a random-access index.
//! All integers are unsigned big-endian; length prefixes of records and
//! record fields are 4-byte "short" fields, chunk lengths, counts and
//! absolute offsets are 8-byte "long" fields.
//!
//! ```text
//! MAGIC                       8 bytes, b"SAMPLEDB"
//! metaLen (long)              length of the metadata block
//! metadata                    UTF-8 JSON: { "schema": [ {content, mime-type}, ... ] }
//! --- samples chunk ---
//! samplesChunkLen (long)      bytes from the field after this to the index chunk
//! numSamples (long)           record count, duplicated in the index chunk
//! record_0 .. record_{n-1}
//! --- index chunk ---
//! indexChunkLen (long)        bytes from the field after this to end of file
//! numSamples (long)
//! offset_0 .. offset_{n-1}    (long each) absolute position of a record's length prefix
//! ```
//!
//! Each record is `recordLen (short)` followed, per schema column in order,
//! by `fieldLen (short)` and `fieldLen` raw bytes. A reader can skip any
//! chunk, record or field it does not need by jumping its length forward,
//! which is what makes indexed access O(1) without a side index file.
//!
//! The chunk length and count fields are written as placeholders when a
//! database is created and backpatched on [`SdbWriter::close`]; a file whose
//! writer never closed has no index and is unreadable.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::CollectionError;

pub mod reader;
pub mod writer;

pub use reader::SdbReader;
pub use writer::SdbWriter;

pub(crate) const MAGIC: &[u8; 8] = b"SAMPLEDB";
pub(crate) const SHORT_FIELD_BYTES: u64 = 4;
pub(crate) const LONG_FIELD_BYTES: u64 = 8;
pub(crate) const MIME_TYPE_TEXT: &str = "text/plain";

/// Role of one record column, matched by readers instead of fixed positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnContent {
    Speech,
    Transcript,
    /// Column written by a future producer; skipped when reading records.
    Unknown,
}

impl From<String> for ColumnContent {
    fn from(content: String) -> Self {
        match content.as_str() {
            "speech" => Self::Speech,
            "transcript" => Self::Transcript,
            _ => Self::Unknown,
        }
    }
}

impl From<ColumnContent> for String {
    fn from(content: ColumnContent) -> Self {
        match content {
            ColumnContent::Speech => "speech".to_string(),
            ColumnContent::Transcript => "transcript".to_string(),
            ColumnContent::Unknown => "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub content: ColumnContent,
    #[serde(rename = "mime-type")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Metadata {
    pub schema: Vec<SchemaColumn>,
}

pub(crate) fn read_u32(
    reader: &mut impl Read,
    context: &'static str,
) -> Result<u32, CollectionError> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| CollectionError::io(context, e))?;
    Ok(u32::from_be_bytes(buf))
}

pub(crate) fn read_u64(
    reader: &mut impl Read,
    context: &'static str,
) -> Result<u64, CollectionError> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|e| CollectionError::io(context, e))?;
    Ok(u64::from_be_bytes(buf))
}

pub(crate) fn write_u32(
    writer: &mut impl Write,
    value: u32,
    context: &'static str,
) -> Result<(), CollectionError> {
    writer
        .write_all(&value.to_be_bytes())
        .map_err(|e| CollectionError::io(context, e))
}

pub(crate) fn write_u64(
    writer: &mut impl Write,
    value: u64,
    context: &'static str,
) -> Result<(), CollectionError> {
    writer
        .write_all(&value.to_be_bytes())
        .map_err(|e| CollectionError::io(context, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_metadata_json_uses_wire_keys() {
        let metadata = Metadata {
            schema: vec![
                SchemaColumn {
                    content: ColumnContent::Speech,
                    mime_type: "audio/opus".to_string(),
                },
                SchemaColumn {
                    content: ColumnContent::Transcript,
                    mime_type: MIME_TYPE_TEXT.to_string(),
                },
            ],
        };
        let json = serde_json::to_string(&metadata).expect("serialize metadata");
        assert!(json.contains("\"mime-type\":\"audio/opus\""));
        assert!(json.contains("\"content\":\"speech\""));

        let parsed: Metadata = serde_json::from_str(&json).expect("parse metadata");
        assert_eq!(parsed.schema.len(), 2);
        assert_eq!(parsed.schema[1].content, ColumnContent::Transcript);
    }

    #[test]
    fn unrecognized_column_content_parses_as_unknown() {
        let json = r#"{"schema":[{"content":"alignment","mime-type":"application/json"}]}"#;
        let parsed: Metadata = serde_json::from_str(json).expect("parse metadata");
        assert_eq!(parsed.schema[0].content, ColumnContent::Unknown);
    }

    #[test]
    fn int_helpers_round_trip_big_endian() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0xDEAD_BEEF, "test").unwrap();
        write_u64(&mut buf, 42, "test").unwrap();
        assert_eq!(&buf[..4], &[0xDE, 0xAD, 0xBE, 0xEF]);

        let mut cursor = std::io::Cursor::new(buf);
        assert_eq!(read_u32(&mut cursor, "test").unwrap(), 0xDEAD_BEEF);
        assert_eq!(read_u64(&mut cursor, "test").unwrap(), 42);
    }
}
