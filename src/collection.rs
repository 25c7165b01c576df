use std::path::{Path, PathBuf};

use crate::config::CollectionConfig;
use crate::error::CollectionError;
use crate::interleave::{Interleaved, InterleavedIter};
use crate::manifest::ManifestReader;
use crate::sdb::SdbReader;
use crate::types::LabeledSample;

/// Capability shared by every sample collection: a count, indexed access and
/// in-order iteration, each yielding labeled samples with tracking ids.
pub trait SampleSource {
    fn len(&self) -> usize;

    fn get(&mut self, index: usize) -> Result<LabeledSample, CollectionError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazy in-order sequence over the whole collection; call again to
    /// restart from the first sample.
    fn iter(&mut self) -> SourceIter<'_, Self>
    where
        Self: Sized,
    {
        SourceIter::new(self)
    }
}

/// Iterator produced by [`SampleSource::iter`], fetching one sample per step.
pub struct SourceIter<'a, S> {
    source: &'a mut S,
    index: usize,
    len: usize,
}

impl<'a, S: SampleSource> SourceIter<'a, S> {
    pub(crate) fn new(source: &'a mut S) -> Self {
        let len = source.len();
        Self {
            source,
            index: 0,
            len,
        }
    }
}

impl<S: SampleSource> Iterator for SourceIter<'_, S> {
    type Item = Result<LabeledSample, CollectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let item = self.source.get(self.index);
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

/// One opened collection file, dispatched by extension.
#[derive(Debug)]
pub enum SampleCollection {
    Sdb(SdbReader),
    Manifest(ManifestReader),
}

impl SampleSource for SampleCollection {
    fn len(&self) -> usize {
        match self {
            Self::Sdb(reader) => reader.len(),
            Self::Manifest(reader) => reader.len(),
        }
    }

    fn get(&mut self, index: usize) -> Result<LabeledSample, CollectionError> {
        match self {
            Self::Sdb(reader) => reader.get(index),
            Self::Manifest(reader) => reader.get(index),
        }
    }
}

/// Opens one collection file, choosing the reader by file extension:
/// `.sdb` for sample databases, `.csv` for manifests.
pub fn samples_from_file(
    path: impl AsRef<Path>,
    config: &CollectionConfig,
) -> Result<SampleCollection, CollectionError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("sdb") => Ok(SampleCollection::Sdb(SdbReader::open_with_buffer(
            path,
            config.buffer_size,
        )?)),
        Some("csv") => Ok(SampleCollection::Manifest(ManifestReader::open(
            path,
            &config.manifest,
        )?)),
        _ => Err(CollectionError::UnknownFormat {
            path: path.display().to_string(),
        }),
    }
}

/// Samples from one or more collection files.
///
/// A single file is served by its reader directly; several files are merged
/// into one globally duration-ordered sequence.
#[derive(Debug)]
pub enum Samples {
    Single(SampleCollection),
    Merged(Interleaved<SampleCollection>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Self::Single(collection) => collection.len(),
            Self::Merged(interleaved) => interleaved.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&mut self) -> SamplesIter<'_> {
        match self {
            Self::Single(collection) => SamplesIter::Single(collection.iter()),
            Self::Merged(interleaved) => SamplesIter::Merged(interleaved.iter()),
        }
    }
}

pub enum SamplesIter<'a> {
    Single(SourceIter<'a, SampleCollection>),
    Merged(InterleavedIter<'a, SampleCollection, fn(&LabeledSample) -> f64>),
}

impl Iterator for SamplesIter<'_> {
    type Item = Result<LabeledSample, CollectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Single(iter) => iter.next(),
            Self::Merged(iter) => iter.next(),
        }
    }
}

/// Opens several collection files as one duration-ordered sample sequence.
pub fn samples_from_files(
    paths: &[PathBuf],
    config: &CollectionConfig,
) -> Result<Samples, CollectionError> {
    match paths {
        [] => Err(CollectionError::invalid_input("no collection files given")),
        [single] => Ok(Samples::Single(samples_from_file(single, config)?)),
        many => {
            let sources = many
                .iter()
                .map(|path| samples_from_file(path, config))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Samples::Merged(Interleaved::new(sources)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_rejected() {
        let config = CollectionConfig::default();
        let err = samples_from_file("samples.txt", &config).unwrap_err();
        assert!(matches!(err, CollectionError::UnknownFormat { .. }));
        let err = samples_from_file("no_extension", &config).unwrap_err();
        assert!(matches!(err, CollectionError::UnknownFormat { .. }));
    }

    #[test]
    fn empty_file_list_is_rejected() {
        let config = CollectionConfig::default();
        let err = samples_from_files(&[], &config).unwrap_err();
        assert!(matches!(err, CollectionError::InvalidInput { .. }));
    }
}
