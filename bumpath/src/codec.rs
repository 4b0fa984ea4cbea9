//! Container codec boundary.
//!
//! The engine never parses container bytes itself. It decodes and encodes
//! through a [`ContainerCodec`], so the binary format can be supplied by an
//! external implementation. [`JsonCodec`] stores the record tree as JSON text
//! and is what the CLI and the tests use.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::record::Container;

/// Errors produced while decoding or encoding a container.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file contents are not a valid container.
    #[error("malformed container {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// Decodes container files into record trees and writes them back.
pub trait ContainerCodec: fmt::Debug + Send + Sync {
    /// Decode the container stored at `location`.
    fn decode(&self, location: &Path) -> Result<Container, CodecError>;

    /// Encode `container`, overwriting the file at `location`.
    fn encode(&self, container: &Container, location: &Path) -> Result<(), CodecError>;
}

/// Codec storing containers as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit indented JSON when encoding.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl ContainerCodec for JsonCodec {
    fn decode(&self, location: &Path) -> Result<Container, CodecError> {
        let bytes = fs::read(location).map_err(|source| CodecError::Io {
            path: location.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| CodecError::Malformed {
            path: location.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn encode(&self, container: &Container, location: &Path) -> Result<(), CodecError> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(container)
        } else {
            serde_json::to_vec(container)
        }
        .map_err(|e| CodecError::Malformed {
            path: location.to_path_buf(),
            reason: e.to_string(),
        })?;

        fs::write(location, encoded).map_err(|source| CodecError::Io {
            path: location.to_path_buf(),
            source,
        })
    }
}
