use crate::error::CollectionError;
use crate::types::{AudioType, Sample};

/// Transcoding capability the sample database writer delegates to when a
/// sample's codec differs from the database's declared one.
///
/// Encoding and decoding audio is outside this crate; callers that need real
/// transcoding plug their own implementation in via
/// [`SdbWriter::with_converter`](crate::SdbWriter::with_converter).
pub trait CodecConverter: Send + Sync {
    /// Audio types this converter can produce as conversion targets.
    fn supported_types(&self) -> &[AudioType];

    fn convert(&self, sample: &Sample, target: AudioType) -> Result<Sample, CollectionError>;
}

/// Default converter for pipelines whose samples already carry the target
/// codec: same-codec samples pass through unchanged, anything else fails.
pub struct PassthroughConverter;

impl CodecConverter for PassthroughConverter {
    fn supported_types(&self) -> &[AudioType] {
        &[]
    }

    fn convert(&self, sample: &Sample, target: AudioType) -> Result<Sample, CollectionError> {
        if sample.audio_type == target {
            Ok(sample.clone())
        } else {
            Err(CollectionError::unsupported_codec(
                "converting between audio types",
                target.as_mime_type(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_returns_same_codec_samples_unchanged() {
        let sample = Sample::new(AudioType::Wav, vec![1, 2, 3]);
        let converted = PassthroughConverter
            .convert(&sample, AudioType::Wav)
            .expect("same codec passes through");
        assert_eq!(converted.data, sample.data);
        assert_eq!(converted.audio_type, AudioType::Wav);
    }

    #[test]
    fn passthrough_rejects_cross_codec_conversion() {
        let sample = Sample::new(AudioType::Wav, vec![1, 2, 3]);
        let err = PassthroughConverter
            .convert(&sample, AudioType::Opus)
            .unwrap_err();
        assert!(matches!(err, CollectionError::UnsupportedCodec { .. }));
    }
}
