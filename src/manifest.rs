use std::path::{Path, PathBuf};

use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::collection::SampleSource;
use crate::config::{ManifestConfig, ManifestUse};
use crate::error::CollectionError;
use crate::types::{AudioFormat, AudioType, LabeledSample, Sample};

/// Reader over a plain tabular manifest of audio files and transcripts.
///
/// Each row names an audio file (resolved relative to the manifest when not
/// absolute), its byte size and a transcript. The row list is materialized at
/// open time, filtered or subsampled per the configured use, and sorted
/// ascending by byte size, a monotonic duration proxy under the fixed PCM
/// assumption. Audio file contents are only read by `get`.
#[derive(Debug)]
pub struct ManifestReader {
    rows: Vec<ManifestRow>,
    skipped: usize,
    audio_format: AudioFormat,
}

#[derive(Debug, Clone)]
struct ManifestRow {
    path: PathBuf,
    byte_size: u64,
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    path: String,
    byte_size: u64,
    transcript: String,
}

impl ManifestReader {
    pub fn open(
        path: impl AsRef<Path>,
        config: &ManifestConfig,
    ) -> Result<Self, CollectionError> {
        let path = path.as_ref();
        let manifest_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut reader =
            csv::Reader::from_path(path).map_err(|e| CollectionError::csv("opening manifest", e))?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize() {
            let raw: RawRow = row.map_err(|e| CollectionError::csv("parsing manifest row", e))?;
            if let ManifestUse::Training {
                min_duration_secs,
                max_duration_secs,
            } = config.usage
            {
                let duration = config.audio_format.estimate_duration_secs(raw.byte_size);
                if duration < min_duration_secs || duration > max_duration_secs {
                    skipped += 1;
                    continue;
                }
            }
            let row_path = PathBuf::from(&raw.path);
            let row_path = if row_path.is_absolute() {
                row_path
            } else {
                manifest_dir.join(row_path)
            };
            rows.push(ManifestRow {
                path: row_path,
                byte_size: raw.byte_size,
                transcript: raw.transcript,
            });
        }
        tracing::info!(
            manifest = %path.display(),
            rows = rows.len(),
            skipped,
            "loaded manifest"
        );

        if let ManifestUse::Evaluation {
            size_cap: Some(size_cap),
        } = config.usage
        {
            if rows.len() > size_cap {
                let mut rng = match config.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                rows.shuffle(&mut rng);
                rows.truncate(size_cap);
                tracing::info!(size_cap, "subsampled evaluation manifest");
            }
        }

        rows.sort_by_key(|row| row.byte_size);

        Ok(Self {
            rows,
            skipped,
            audio_format: config.audio_format,
        })
    }

    /// Rows excluded by the training duration window.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl SampleSource for ManifestReader {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn get(&mut self, index: usize) -> Result<LabeledSample, CollectionError> {
        let row = self
            .rows
            .get(index)
            .ok_or(CollectionError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            })?;
        let data = std::fs::read(&row.path)
            .map_err(|e| CollectionError::io("reading manifest audio file", e))?;
        Ok(LabeledSample {
            sample: Sample::new(AudioType::Wav, data),
            transcript: row.transcript.clone(),
            sample_id: Some(row.path.display().to_string()),
            duration_secs: self.audio_format.estimate_duration_secs(row.byte_size),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, name: &str, rows: &[(&str, u64, &str)]) -> PathBuf {
        let path = dir.join(name);
        let mut contents = String::from("path,byte_size,transcript\n");
        for (file, byte_size, transcript) in rows {
            contents.push_str(&format!("{file},{byte_size},{transcript}\n"));
        }
        std::fs::write(&path, contents).expect("write manifest");
        path
    }

    fn training_config(min_duration_secs: f64, max_duration_secs: f64) -> ManifestConfig {
        ManifestConfig {
            usage: ManifestUse::Training {
                min_duration_secs,
                max_duration_secs,
            },
            ..ManifestConfig::default()
        }
    }

    #[test]
    fn training_window_excludes_and_counts_short_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        // 16044 bytes is 0.5 s under the 16 kHz mono 16-bit assumption.
        let manifest = write_manifest(dir.path(), "train.csv", &[("half.wav", 16_044, "half")]);

        let reader =
            ManifestReader::open(&manifest, &training_config(1.0, 10.0)).expect("open");
        assert_eq!(reader.len(), 0);
        assert_eq!(reader.skipped(), 1);

        let reader =
            ManifestReader::open(&manifest, &training_config(0.1, 1.0)).expect("open");
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.skipped(), 0);
    }

    #[test]
    fn rows_sort_ascending_by_byte_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = write_manifest(
            dir.path(),
            "train.csv",
            &[
                ("long.wav", 64_044, "long"),
                ("short.wav", 16_044, "short"),
                ("medium.wav", 32_044, "medium"),
            ],
        );

        let reader = ManifestReader::open(&manifest, &ManifestConfig::default()).expect("open");
        let transcripts: Vec<&str> = reader.rows.iter().map(|r| r.transcript.as_str()).collect();
        assert_eq!(transcripts, ["short", "medium", "long"]);
    }

    #[test]
    fn relative_paths_resolve_against_the_manifest_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = write_manifest(dir.path(), "eval.csv", &[("clips/a.wav", 100, "a")]);

        let reader = ManifestReader::open(&manifest, &ManifestConfig::default()).expect("open");
        assert_eq!(reader.rows[0].path, dir.path().join("clips/a.wav"));
    }

    #[test]
    fn evaluation_cap_subsamples_without_replacement() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rows: Vec<(String, u64, String)> = (0..10)
            .map(|i| (format!("clip{i}.wav"), 1_000 * (i + 1), format!("t{i}")))
            .collect();
        let row_refs: Vec<(&str, u64, &str)> = rows
            .iter()
            .map(|(file, size, transcript)| (file.as_str(), *size, transcript.as_str()))
            .collect();
        let manifest = write_manifest(dir.path(), "eval.csv", &row_refs);

        let config = ManifestConfig {
            usage: ManifestUse::Evaluation { size_cap: Some(4) },
            seed: Some(7),
            ..ManifestConfig::default()
        };
        let reader = ManifestReader::open(&manifest, &config).expect("open");
        assert_eq!(reader.len(), 4);

        // Distinct rows, still sorted by size after the subsample.
        let sizes: Vec<u64> = reader.rows.iter().map(|r| r.byte_size).collect();
        let mut deduped = sizes.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), 4);
        assert!(sizes.windows(2).all(|pair| pair[0] < pair[1]));

        // The same seed picks the same subset.
        let reader_again = ManifestReader::open(&manifest, &config).expect("open");
        let sizes_again: Vec<u64> = reader_again.rows.iter().map(|r| r.byte_size).collect();
        assert_eq!(sizes, sizes_again);
    }

    #[test]
    fn get_reads_the_referenced_file_and_tags_it_wav() {
        let dir = tempfile::tempdir().expect("tempdir");
        let audio_path = dir.path().join("clip.wav");
        std::fs::write(&audio_path, vec![7u8; 16_044]).expect("write audio");
        let manifest = write_manifest(dir.path(), "eval.csv", &[("clip.wav", 16_044, "hello")]);

        let mut reader = ManifestReader::open(&manifest, &ManifestConfig::default()).expect("open");
        let sample = reader.get(0).expect("get");
        assert_eq!(sample.sample.audio_type, AudioType::Wav);
        assert_eq!(sample.sample.data.len(), 16_044);
        assert_eq!(sample.transcript, "hello");
        assert_eq!(
            sample.sample_id.as_deref(),
            Some(audio_path.display().to_string().as_str())
        );
        assert!((sample.duration_secs - 0.5).abs() < 1e-12);

        let err = reader.get(1).unwrap_err();
        assert!(matches!(err, CollectionError::IndexOutOfRange { .. }));
    }
}
