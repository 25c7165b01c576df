pub mod codec;
pub mod collection;
pub mod config;
pub mod error;
pub mod interleave;
pub mod manifest;
pub mod sdb;
pub mod types;

pub use codec::{CodecConverter, PassthroughConverter};
pub use collection::{
    samples_from_file, samples_from_files, SampleCollection, SampleSource, Samples, SamplesIter,
};
pub use config::{CollectionConfig, ManifestConfig, ManifestUse};
pub use error::CollectionError;
pub use interleave::Interleaved;
pub use manifest::ManifestReader;
pub use sdb::{SdbReader, SdbWriter};
pub use types::{AudioFormat, AudioType, LabeledSample, Sample};
