use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("CSV error while {context}: {source}")]
    Csv {
        context: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("not a sample database: {message}")]
    Format { message: String },
    #[error("schema mismatch: {message}")]
    Schema { message: String },
    #[error("audio type \"{mime_type}\" not supported while {context}")]
    UnsupportedCodec {
        context: &'static str,
        mime_type: String,
    },
    #[error("sample index {index} out of range: collection holds {len} samples")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("unknown collection format: \"{path}\"")]
    UnknownFormat { path: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl CollectionError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn csv(context: &'static str, source: csv::Error) -> Self {
        Self::Csv { context, source }
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported_codec(context: &'static str, mime_type: impl Into<String>) -> Self {
        Self::UnsupportedCodec {
            context,
            mime_type: mime_type.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
