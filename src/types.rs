/// Byte count of the fixed RIFF header assumed by size-based duration estimates.
pub(crate) const WAV_HEADER_BYTES: u64 = 44;

/// Codec tag carried by every audio payload.
///
/// The wire identity of a codec is its MIME string; `Wav` and `Opus` form the
/// serializable set a sample database may declare for its speech column.
/// `Pcm` marks decoded in-memory audio that cannot be persisted directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioType {
    Wav,
    Opus,
    Pcm,
}

impl AudioType {
    pub const SERIALIZABLE: [AudioType; 2] = [AudioType::Wav, AudioType::Opus];

    pub fn as_mime_type(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Opus => "audio/opus",
            Self::Pcm => "audio/pcm",
        }
    }

    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type {
            "audio/wav" => Some(Self::Wav),
            "audio/opus" => Some(Self::Opus),
            "audio/pcm" => Some(Self::Pcm),
            _ => None,
        }
    }

    pub fn is_serializable(self) -> bool {
        Self::SERIALIZABLE.contains(&self)
    }
}

/// Decode parameters of a raw audio payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub sample_width_bytes: u16,
}

impl AudioFormat {
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 16_000;

    /// Estimates the duration in seconds of an audio file of `byte_size`
    /// bytes, assuming a fixed-size header followed by single-channel PCM of
    /// this format's rate and width. The assumption is not validated; other
    /// formats yield a misestimate that is still monotonic in file size.
    pub fn estimate_duration_secs(&self, byte_size: u64) -> f64 {
        let payload = byte_size.saturating_sub(WAV_HEADER_BYTES);
        payload as f64 / self.sample_rate_hz as f64 / self.sample_width_bytes as f64
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate_hz: Self::DEFAULT_SAMPLE_RATE_HZ,
            channels: 1,
            sample_width_bytes: 2,
        }
    }
}

/// In-memory audio payload with its codec tag and optional decode parameters.
#[derive(Debug, Clone)]
pub struct Sample {
    pub audio_type: AudioType,
    pub data: Vec<u8>,
    pub format: Option<AudioFormat>,
}

impl Sample {
    pub fn new(audio_type: AudioType, data: Vec<u8>) -> Self {
        Self {
            audio_type,
            data,
            format: None,
        }
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// A speech sample paired with the transcript of its utterance.
///
/// `sample_id` is a tracking identifier assigned by collection readers and
/// writers (`"{source}:{index}"` or a file path). `duration_secs` is the
/// size-derived estimate readers attach at access time; the ordered merge
/// keys on it. Immutable once handed to a consumer.
#[derive(Debug, Clone)]
pub struct LabeledSample {
    pub sample: Sample,
    pub transcript: String,
    pub sample_id: Option<String>,
    pub duration_secs: f64,
}

impl LabeledSample {
    pub fn new(sample: Sample, transcript: impl Into<String>) -> Self {
        let duration_secs = sample
            .format
            .unwrap_or_default()
            .estimate_duration_secs(sample.data.len() as u64);
        Self {
            sample,
            transcript: transcript.into(),
            sample_id: None,
            duration_secs,
        }
    }

    pub fn with_id(mut self, sample_id: impl Into<String>) -> Self {
        self.sample_id = Some(sample_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_types_round_trip_for_serializable_set() {
        for audio_type in AudioType::SERIALIZABLE {
            assert_eq!(
                AudioType::from_mime_type(audio_type.as_mime_type()),
                Some(audio_type)
            );
            assert!(audio_type.is_serializable());
        }
        assert!(!AudioType::Pcm.is_serializable());
        assert_eq!(AudioType::from_mime_type("audio/flac"), None);
    }

    #[test]
    fn duration_estimate_matches_fixed_pcm_assumption() {
        let format = AudioFormat::default();
        // 16044 bytes minus the 44 byte header is one second of payload halved.
        assert!((format.estimate_duration_secs(16_044) - 0.5).abs() < 1e-12);
        // Smaller than the header saturates to zero instead of going negative.
        assert_eq!(format.estimate_duration_secs(10), 0.0);
    }

    #[test]
    fn labeled_sample_estimates_duration_from_payload() {
        let sample = Sample::new(AudioType::Wav, vec![0u8; 16_044]);
        let labeled = LabeledSample::new(sample, "hello").with_id("test:0");
        assert!((labeled.duration_secs - 0.5).abs() < 1e-12);
        assert_eq!(labeled.sample_id.as_deref(), Some("test:0"));
    }
}
