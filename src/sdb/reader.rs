use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::collection::SampleSource;
use crate::config::DEFAULT_BUFFER_SIZE;
use crate::error::CollectionError;
use crate::sdb::{
    read_u32, read_u64, ColumnContent, Metadata, SchemaColumn, LONG_FIELD_BYTES, MAGIC,
    MIME_TYPE_TEXT, SHORT_FIELD_BYTES,
};
use crate::types::{AudioFormat, AudioType, LabeledSample, Sample};

/// Random-access reader over a closed sample database.
///
/// Opening parses the header, schema and offset index; record bodies are only
/// touched by [`get`](SampleSource::get). One reader owns one file handle and
/// cursor, so concurrent consumers should each open their own instance.
#[derive(Debug)]
pub struct SdbReader {
    id_prefix: String,
    file: BufReader<File>,
    schema: Vec<SchemaColumn>,
    speech_index: usize,
    transcript_index: usize,
    audio_type: AudioType,
    offsets: Vec<u64>,
}

impl SdbReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CollectionError> {
        Self::open_with_buffer(path, DEFAULT_BUFFER_SIZE)
    }

    pub fn open_with_buffer(
        path: impl AsRef<Path>,
        buffer_size: usize,
    ) -> Result<Self, CollectionError> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| CollectionError::io("opening sample database", e))?;
        let mut file = BufReader::with_capacity(buffer_size, file);

        let mut magic = [0u8; MAGIC.len()];
        file.read_exact(&mut magic)
            .map_err(|e| CollectionError::io("reading container magic", e))?;
        if &magic != MAGIC {
            return Err(CollectionError::format(format!(
                "\"{}\" has no sample database magic",
                path.display()
            )));
        }

        let metadata_len = read_u64(&mut file, "reading metadata length")?;
        let mut metadata = vec![0u8; metadata_len as usize];
        file.read_exact(&mut metadata)
            .map_err(|e| CollectionError::io("reading schema metadata", e))?;
        let metadata: Metadata = serde_json::from_slice(&metadata)
            .map_err(|e| CollectionError::json("parsing schema metadata", e))?;
        let schema = metadata.schema;

        let speech_index = find_column(&schema, ColumnContent::Speech, |mime_type| {
            AudioType::from_mime_type(mime_type).is_some_and(AudioType::is_serializable)
        })
        .ok_or_else(|| {
            CollectionError::schema("no speech column with a supported audio type")
        })?;
        let audio_type = AudioType::from_mime_type(&schema[speech_index].mime_type)
            .ok_or_else(|| CollectionError::schema("speech column has no audio type"))?;
        let transcript_index = find_column(&schema, ColumnContent::Transcript, |mime_type| {
            mime_type == MIME_TYPE_TEXT
        })
        .ok_or_else(|| CollectionError::schema("no transcript column"))?;

        // Jump over the records without parsing them; the sample count is
        // duplicated on both sides of the records, which catches files whose
        // writer never wrote the index.
        let samples_chunk_len = read_u64(&mut file, "reading samples chunk length")?;
        let samples_count = read_u64(&mut file, "reading sample count")?;
        let record_bytes = samples_chunk_len
            .checked_sub(LONG_FIELD_BYTES)
            .ok_or_else(|| CollectionError::format("samples chunk shorter than its count field"))?;
        file.seek_relative(record_bytes as i64)
            .map_err(|e| CollectionError::io("skipping samples chunk", e))?;

        let index_chunk_len = read_u64(&mut file, "reading index chunk length")?;
        let index_count = read_u64(&mut file, "reading index sample count")?;
        if index_count != samples_count {
            return Err(CollectionError::format(
                "sample counts of the samples and index chunks disagree",
            ));
        }
        let expected_index_len = index_count
            .checked_mul(LONG_FIELD_BYTES)
            .and_then(|offset_bytes| offset_bytes.checked_add(LONG_FIELD_BYTES));
        if expected_index_len != Some(index_chunk_len) {
            return Err(CollectionError::format(
                "index chunk length does not match its sample count",
            ));
        }
        let mut offsets = Vec::with_capacity(index_count as usize);
        for _ in 0..index_count {
            offsets.push(read_u64(&mut file, "reading index offset")?);
        }

        Ok(Self {
            id_prefix: path.display().to_string(),
            file,
            schema,
            speech_index,
            transcript_index,
            audio_type,
            offsets,
        })
    }

    /// Overrides the tracking-id prefix, which defaults to the source path.
    pub fn with_id_prefix(mut self, id_prefix: impl Into<String>) -> Self {
        self.id_prefix = id_prefix.into();
        self
    }

    pub fn audio_type(&self) -> AudioType {
        self.audio_type
    }

    pub fn schema(&self) -> &[SchemaColumn] {
        &self.schema
    }

    fn read_record(&mut self, index: usize) -> Result<(Vec<u8>, Vec<u8>), CollectionError> {
        let offset = *self
            .offsets
            .get(index)
            .ok_or(CollectionError::IndexOutOfRange {
                index,
                len: self.offsets.len(),
            })?;
        // Skip the record length prefix; column lengths drive the walk.
        self.file
            .seek(SeekFrom::Start(offset + SHORT_FIELD_BYTES))
            .map_err(|e| CollectionError::io("seeking record", e))?;

        let mut speech = None;
        let mut transcript = None;
        for column_index in 0..self.schema.len() {
            let field_len = read_u32(&mut self.file, "reading record field length")? as usize;
            if column_index == self.speech_index || column_index == self.transcript_index {
                let mut data = vec![0u8; field_len];
                self.file
                    .read_exact(&mut data)
                    .map_err(|e| CollectionError::io("reading record field", e))?;
                if column_index == self.speech_index {
                    speech = Some(data);
                } else {
                    transcript = Some(data);
                }
                if speech.is_some() && transcript.is_some() {
                    break;
                }
            } else {
                self.file
                    .seek_relative(field_len as i64)
                    .map_err(|e| CollectionError::io("skipping record field", e))?;
            }
        }
        match (speech, transcript) {
            (Some(speech), Some(transcript)) => Ok((speech, transcript)),
            _ => Err(CollectionError::format(
                "record ended before its speech and transcript columns",
            )),
        }
    }
}

impl SampleSource for SdbReader {
    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn get(&mut self, index: usize) -> Result<LabeledSample, CollectionError> {
        let (speech, transcript) = self.read_record(index)?;
        let transcript = String::from_utf8(transcript)
            .map_err(|_| CollectionError::format("transcript field is not valid UTF-8"))?;
        let duration_secs = AudioFormat::default().estimate_duration_secs(speech.len() as u64);
        Ok(LabeledSample {
            sample: Sample::new(self.audio_type, speech),
            transcript,
            sample_id: Some(format!("{}:{index}", self.id_prefix)),
            duration_secs,
        })
    }
}

fn find_column(
    schema: &[SchemaColumn],
    content: ColumnContent,
    accepts_mime_type: impl Fn(&str) -> bool,
) -> Option<usize> {
    schema
        .iter()
        .position(|column| column.content == content && accepts_mime_type(&column.mime_type))
}
