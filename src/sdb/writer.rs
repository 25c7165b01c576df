use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::codec::{CodecConverter, PassthroughConverter};
use crate::config::DEFAULT_BUFFER_SIZE;
use crate::error::CollectionError;
use crate::sdb::{
    write_u32, write_u64, ColumnContent, Metadata, SchemaColumn, LONG_FIELD_BYTES, MAGIC,
    MIME_TYPE_TEXT, SHORT_FIELD_BYTES,
};
use crate::types::{AudioType, LabeledSample};

/// Streaming writer for a sample database.
///
/// Samples are appended with [`add`](Self::add) while the offset index grows
/// in memory; [`close`](Self::close) backpatches the chunk lengths and writes
/// the index. A writer that is dropped without closing leaves a truncated,
/// unreadable file.
pub struct SdbWriter {
    id_prefix: String,
    audio_type: AudioType,
    file: Option<BufWriter<File>>,
    offsets: Vec<u64>,
    num_samples: u64,
    samples_chunk_start: u64,
    converter: Box<dyn CodecConverter>,
}

impl std::fmt::Debug for SdbWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdbWriter")
            .field("id_prefix", &self.id_prefix)
            .field("audio_type", &self.audio_type)
            .field("file", &self.file)
            .field("offsets", &self.offsets)
            .field("num_samples", &self.num_samples)
            .field("samples_chunk_start", &self.samples_chunk_start)
            .field("converter", &"Box<dyn CodecConverter>")
            .finish()
    }
}

impl SdbWriter {
    /// Creates the target file and writes magic, schema metadata and the two
    /// placeholder fields of the samples chunk.
    ///
    /// `audio_type` becomes the database's declared speech codec and must be
    /// serializable.
    pub fn create(path: impl AsRef<Path>, audio_type: AudioType) -> Result<Self, CollectionError> {
        let path = path.as_ref();
        if !audio_type.is_serializable() {
            return Err(CollectionError::unsupported_codec(
                "creating sample database",
                audio_type.as_mime_type(),
            ));
        }

        let file = File::create(path).map_err(|e| CollectionError::io("creating sample database", e))?;
        let mut file = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
        file.write_all(MAGIC)
            .map_err(|e| CollectionError::io("writing container magic", e))?;

        let metadata = Metadata {
            schema: vec![
                SchemaColumn {
                    content: ColumnContent::Speech,
                    mime_type: audio_type.as_mime_type().to_string(),
                },
                SchemaColumn {
                    content: ColumnContent::Transcript,
                    mime_type: MIME_TYPE_TEXT.to_string(),
                },
            ],
        };
        let metadata = serde_json::to_vec(&metadata)
            .map_err(|e| CollectionError::json("encoding schema metadata", e))?;
        write_u64(&mut file, metadata.len() as u64, "writing metadata length")?;
        file.write_all(&metadata)
            .map_err(|e| CollectionError::io("writing schema metadata", e))?;

        // Leave room for samplesChunkLen and numSamples; close() patches them.
        let samples_chunk_start = file
            .stream_position()
            .map_err(|e| CollectionError::io("locating samples chunk", e))?;
        file.seek(SeekFrom::Current(2 * LONG_FIELD_BYTES as i64))
            .map_err(|e| CollectionError::io("reserving samples chunk fields", e))?;

        Ok(Self {
            id_prefix: path.display().to_string(),
            audio_type,
            file: Some(file),
            offsets: Vec::new(),
            num_samples: 0,
            samples_chunk_start,
            converter: Box::new(PassthroughConverter),
        })
    }

    /// Overrides the tracking-id prefix, which defaults to the target path.
    pub fn with_id_prefix(mut self, id_prefix: impl Into<String>) -> Self {
        self.id_prefix = id_prefix.into();
        self
    }

    /// Installs the codec collaborator used when an added sample's codec
    /// differs from the database's declared one.
    pub fn with_converter(mut self, converter: Box<dyn CodecConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Appends one record and returns the tracking id assigned to it.
    ///
    /// Single-producer: callers sharing a writer need external locking.
    pub fn add(&mut self, sample: &LabeledSample) -> Result<String, CollectionError> {
        let audio: Cow<'_, [u8]> = if sample.sample.audio_type == self.audio_type {
            Cow::Borrowed(&sample.sample.data)
        } else {
            Cow::Owned(self.converter.convert(&sample.sample, self.audio_type)?.data)
        };
        let transcript = sample.transcript.as_bytes();

        let audio_len = short_field(audio.len())?;
        let transcript_len = short_field(transcript.len())?;
        let record_len =
            short_field(2 * SHORT_FIELD_BYTES as usize + audio.len() + transcript.len())?;

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CollectionError::invalid_input("sample database is already closed"))?;
        let offset = file
            .stream_position()
            .map_err(|e| CollectionError::io("locating record start", e))?;
        write_u32(file, record_len, "writing record length")?;
        write_u32(file, audio_len, "writing speech field length")?;
        file.write_all(&audio)
            .map_err(|e| CollectionError::io("writing speech field", e))?;
        write_u32(file, transcript_len, "writing transcript field length")?;
        file.write_all(transcript)
            .map_err(|e| CollectionError::io("writing transcript field", e))?;

        self.offsets.push(offset);
        let sample_id = format!("{}:{}", self.id_prefix, self.num_samples);
        self.num_samples += 1;
        Ok(sample_id)
    }

    /// Backpatches the samples chunk fields and writes the index chunk.
    /// No-op when already closed.
    pub fn close(&mut self) -> Result<(), CollectionError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        let index_chunk_start = file
            .stream_position()
            .map_err(|e| CollectionError::io("locating index chunk", e))?;
        file.seek(SeekFrom::Start(self.samples_chunk_start))
            .map_err(|e| CollectionError::io("seeking samples chunk fields", e))?;
        write_u64(
            &mut file,
            index_chunk_start - self.samples_chunk_start - LONG_FIELD_BYTES,
            "patching samples chunk length",
        )?;
        write_u64(&mut file, self.num_samples, "patching sample count")?;

        file.seek(SeekFrom::Start(index_chunk_start + LONG_FIELD_BYTES))
            .map_err(|e| CollectionError::io("seeking index chunk", e))?;
        write_u64(&mut file, self.num_samples, "writing index sample count")?;
        for offset in &self.offsets {
            write_u64(&mut file, *offset, "writing index offset")?;
        }

        let index_end = file
            .stream_position()
            .map_err(|e| CollectionError::io("locating index end", e))?;
        file.seek(SeekFrom::Start(index_chunk_start))
            .map_err(|e| CollectionError::io("seeking index chunk length", e))?;
        write_u64(
            &mut file,
            index_end - index_chunk_start - LONG_FIELD_BYTES,
            "patching index chunk length",
        )?;
        file.flush()
            .map_err(|e| CollectionError::io("flushing sample database", e))?;
        Ok(())
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn audio_type(&self) -> AudioType {
        self.audio_type
    }
}

impl Drop for SdbWriter {
    fn drop(&mut self) {
        if self.file.is_some() {
            tracing::warn!(
                id_prefix = self.id_prefix.as_str(),
                samples = self.num_samples,
                "sample database writer dropped without close; the file has no index"
            );
        }
    }
}

fn short_field(len: usize) -> Result<u32, CollectionError> {
    u32::try_from(len).map_err(|_| {
        CollectionError::invalid_input(format!(
            "field of {len} bytes exceeds the 4-byte length prefix"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;

    fn labeled(data: &[u8], transcript: &str) -> LabeledSample {
        LabeledSample::new(Sample::new(AudioType::Wav, data.to_vec()), transcript)
    }

    #[test]
    fn create_rejects_non_serializable_audio_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = SdbWriter::create(dir.path().join("samples.sdb"), AudioType::Pcm).unwrap_err();
        assert!(matches!(err, CollectionError::UnsupportedCodec { .. }));
    }

    #[test]
    fn add_assigns_sequential_ids_and_grows_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = SdbWriter::create(dir.path().join("samples.sdb"), AudioType::Wav)
            .expect("create")
            .with_id_prefix("train");
        assert!(writer.is_empty());

        let first = writer.add(&labeled(b"aaaa", "A")).expect("add");
        let second = writer.add(&labeled(b"bb", "BB")).expect("add");
        assert_eq!(first, "train:0");
        assert_eq!(second, "train:1");
        assert_eq!(writer.len(), 2);
        writer.close().expect("close");
    }

    #[test]
    fn add_after_close_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer =
            SdbWriter::create(dir.path().join("samples.sdb"), AudioType::Wav).expect("create");
        writer.close().expect("close");
        writer.close().expect("second close is a no-op");
        let err = writer.add(&labeled(b"aaaa", "A")).unwrap_err();
        assert!(matches!(err, CollectionError::InvalidInput { .. }));
    }

    #[test]
    fn cross_codec_add_fails_without_a_real_converter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer =
            SdbWriter::create(dir.path().join("samples.sdb"), AudioType::Opus).expect("create");
        let err = writer.add(&labeled(b"riff", "A")).unwrap_err();
        assert!(matches!(err, CollectionError::UnsupportedCodec { .. }));
        writer.close().expect("close");
    }
}
