use crate::types::AudioFormat;

/// Read and write buffer size for collection files.
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub buffer_size: usize,
    pub manifest: ManifestConfig,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            manifest: ManifestConfig::default(),
        }
    }
}

/// How a manifest's rows are selected before sorting.
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    pub usage: ManifestUse,
    /// Format assumed by the size-based duration estimate. Manifests do not
    /// record audio parameters, so the estimate silently misestimates files
    /// that deviate from it.
    pub audio_format: AudioFormat,
    /// Seed for the evaluation subsample; random when absent.
    pub seed: Option<u64>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            usage: ManifestUse::default(),
            audio_format: AudioFormat::default(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ManifestUse {
    /// Keep only rows whose estimated duration falls inside the window;
    /// everything else is counted as skipped.
    Training {
        min_duration_secs: f64,
        max_duration_secs: f64,
    },
    /// Keep every row, optionally subsampled without replacement down to
    /// `size_cap` for confidence-bounded evaluation.
    Evaluation { size_cap: Option<usize> },
}

impl Default for ManifestUse {
    fn default() -> Self {
        Self::Evaluation { size_cap: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_config_default() {
        let config = CollectionConfig::default();
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(
            config.manifest.usage,
            ManifestUse::Evaluation { size_cap: None }
        );
        assert_eq!(
            config.manifest.audio_format.sample_rate_hz,
            AudioFormat::DEFAULT_SAMPLE_RATE_HZ
        );
        assert!(config.manifest.seed.is_none());
    }
}
