use cuemix_edl::{CompileError, StoreError};
use cuemix_media::MediaError;
use cuemix_render::RenderError;
use thiserror::Error;

/// Wire-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Io,
    Internal,
    Cancelled,
}

impl ErrorKind {
    /// Error code string on the wire. I/O failures surface as
    /// `INTERNAL`; the taxonomy distinguishes them internally for
    /// cleanup behavior only.
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::Io | Self::Internal => "INTERNAL",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Top-level error for engine front-end operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No EDL currently loaded")]
    NoEdlLoaded,

    #[error("EDL ID mismatch: requested `{requested}` but `{loaded}` is loaded")]
    EdlIdMismatch { requested: String, loaded: String },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("failed to hash output file `{path}`: {source}")]
    HashOutput {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(_) => ErrorKind::InvalidArgument,
            Self::NoEdlLoaded | Self::EdlIdMismatch { .. } => ErrorKind::NotFound,
            Self::Compile(_) => ErrorKind::Internal,
            Self::Render(err) => match err {
                RenderError::EmptyRange | RenderError::CreateOutputDir { .. } => {
                    ErrorKind::InvalidArgument
                }
                RenderError::Cancelled => ErrorKind::Cancelled,
                RenderError::WriteOutput { .. } => ErrorKind::Io,
                RenderError::MediaOpen { .. } | RenderError::MediaRead { .. } => {
                    ErrorKind::Internal
                }
            },
            Self::Media(err) => match err {
                MediaError::NotFound { .. } => ErrorKind::NotFound,
                _ => ErrorKind::InvalidArgument,
            },
            Self::HashOutput { .. } => ErrorKind::Io,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}
