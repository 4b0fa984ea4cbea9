//! Error taxonomy for scanning, rewriting and merging.
//!
//! Scanning and rewriting fail fast: the first error stops the invocation.
//! Merging is best effort; a linked container that cannot be decoded is
//! logged and recorded in [`MergeOutcome::skipped`](crate::merge::MergeOutcome)
//! instead of being returned as an error.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecError;
use crate::record::RecordKey;
use crate::unify::{HashError, UnifiedKey};

/// Result type for engine operations.
pub type BumResult<T> = Result<T, BumError>;

/// Who referenced a path in a scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceOwner {
    /// A string value inside a record.
    Record(RecordKey),

    /// A container link (or scan root), tracked across the whole session.
    AllContainers,
}

impl fmt::Display for ReferenceOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceOwner::Record(key) => write!(f, "record {}", key),
            ReferenceOwner::AllContainers => write!(f, "container links"),
        }
    }
}

/// Errors that can occur while repathing.
#[derive(Debug, Error)]
pub enum BumError {
    /// A container could not be decoded.
    #[error("failed to decode container {key}: {source}")]
    Decode {
        key: UnifiedKey,
        #[source]
        source: CodecError,
    },

    /// A rewritten container could not be written back.
    #[error("failed to encode container {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// Rewrite was requested but the scan found no records.
    #[error("scan produced no records; select at least one container and scan first")]
    EmptyScan,

    /// A referenced file does not exist in any source directory.
    #[error("missing file '{path}' referenced by {owner}")]
    MissingReference { owner: ReferenceOwner, path: String },

    /// A container to scan is not in the overlay index.
    #[error("container {key} is not in any source directory")]
    MissingContainer { key: UnifiedKey },

    /// A prefix cannot be used as a path segment.
    #[error("invalid prefix '{0}': must be a non-empty single path segment")]
    InvalidPrefix(String),

    /// A selection glob could not be parsed.
    #[error("invalid selection pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Merge was requested for a root that the rewrite did not output.
    #[error("root container {key} has no rewritten output")]
    RootNotWritten { key: UnifiedKey },

    /// Hashing a long output file name failed.
    #[error("failed to hash '{path}': {source}")]
    Hash {
        path: String,
        #[source]
        source: HashError,
    },

    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BumError {
    /// Stable kind name for surfacing errors as `(kind, message)` pairs.
    pub fn kind(&self) -> &'static str {
        match self {
            BumError::Decode { .. } => "DecodeError",
            BumError::Encode { .. } => "EncodeError",
            BumError::EmptyScan => "EmptyScan",
            BumError::MissingReference { .. } => "MissingReference",
            BumError::MissingContainer { .. } => "MissingContainer",
            BumError::InvalidPrefix(_) => "InvalidPrefix",
            BumError::InvalidPattern { .. } => "InvalidPattern",
            BumError::RootNotWritten { .. } => "RootNotWritten",
            BumError::Hash { .. } => "HashError",
            BumError::Io { .. } => "IoError",
        }
    }

    /// The error as a `(kind, message)` pair.
    pub fn to_pair(&self) -> (&'static str, String) {
        (self.kind(), self.to_string())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BumError::Io {
            path: path.into(),
            source,
        }
    }
}
