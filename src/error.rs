//! Crate-level error type for the training pipeline.
//!
//! Collaborators (sample streams, dictionaries, the training engine) report
//! `std::io::Error`; the pipeline wraps those with the stage they happened in.
//! Every variant is fatal for a run and falls in one of two classes, see
//! [`ErrorKind`].
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad class of a pipeline failure, used for the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid settings or an invalid combination of options
    Configuration,
    /// Reading the corpus, loading a dictionary or writing the model failed
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Training parameters file '{}' is invalid!", path.display())]
    InvalidTrainingParameters { path: PathBuf },

    #[error("Sequence training is not supported, requested by '{}'", path.display())]
    SequenceTrainingUnsupported { path: PathBuf },

    #[error("Unknown algorithm type: '{selector}' (expected maxent, perceptron or perceptron_sequence)")]
    UnknownAlgorithm { selector: String },

    #[error("Can't extend a POS dictionary that does not support incremental population")]
    ImmutableTagDictionary,

    #[error("The {label} file '{}' is not writable: {reason}", path.display())]
    InvalidOutputFile {
        label: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("IO error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Attach a description of what was being done to an I/O failure.
    pub fn io<C: Into<String>>(context: C, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } => ErrorKind::Io,
            _ => ErrorKind::Configuration,
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Configuration => 1,
            ErrorKind::Io => 2,
        }
    }
}
