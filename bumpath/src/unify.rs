//! Path unification.
//!
//! Every referenceable asset path is reduced to a single [`UnifiedKey`] so that
//! different spellings of the same asset (mixed case, backslashes, or an
//! already-hashed file name) compare equal.
//!
//! # Key Forms
//!
//! ```text
//! "ASSETS\Characters\Ahri\ahri.dds"   ─┐
//! "assets/characters/ahri/ahri.dds"   ─┼─► xxh64(lower(path)) ─► "3f1c0a7e9b2d4c55"
//! "3F1C0A7E9B2D4C55.dds"              ─┘   (already hashed, extension stripped)
//! ```
//!
//! The hash token is the 16 hex digit form used by the archive's own path
//! hashing scheme. When the hasher is unavailable the key degrades to the
//! lower-cased, forward-slash literal path instead of failing the scan.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

/// Width of a hash token in hex digits.
pub const HASH_TOKEN_LEN: usize = 16;

/// Canonical identity of a referenceable path.
///
/// Either a lower-case hash token or, when hashing is unavailable, a
/// lower-cased forward-slash path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnifiedKey(String);

impl UnifiedKey {
    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this key is a hash token (as opposed to a literal fallback).
    pub fn is_hash(&self) -> bool {
        is_hash_token(&self.0)
    }
}

impl fmt::Display for UnifiedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UnifiedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors produced by a [`PathHasher`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    /// The hashing backend cannot be used.
    #[error("path hasher unavailable: {0}")]
    Unavailable(String),
}

/// Computes the archive hash token for a raw path.
pub trait PathHasher: fmt::Debug + Send + Sync {
    /// Hash a path into its hex token form.
    fn hash_token(&self, path: &str) -> Result<String, HashError>;
}

/// The archive's path hash: xxh64 (seed 0) over the lower-cased path.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh64PathHasher;

impl PathHasher for Xxh64PathHasher {
    fn hash_token(&self, path: &str) -> Result<String, HashError> {
        let hash = xxh64(path.to_lowercase().as_bytes(), 0);
        Ok(format!("{:016x}", hash))
    }
}

fn hash_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{16}$").unwrap())
}

/// Check if a string is a fixed-width hex hash token.
///
/// ```
/// use bumpath::unify::is_hash_token;
///
/// assert!(is_hash_token("0123456789abcdef"));
/// assert!(is_hash_token("0123456789ABCDEF"));
/// assert!(!is_hash_token("0123456789abcde"));
/// assert!(!is_hash_token("assets/foo.tex"));
/// ```
pub fn is_hash_token(s: &str) -> bool {
    hash_token_pattern().is_match(s)
}

/// Replace backslashes with forward slashes.
pub fn normalize_separators(raw: &str) -> String {
    raw.replace('\\', "/")
}

/// Normalizes raw paths into [`UnifiedKey`]s.
#[derive(Debug)]
pub struct PathUnifier {
    hasher: Box<dyn PathHasher>,
}

impl PathUnifier {
    /// Create a unifier backed by the given hasher.
    pub fn new(hasher: impl PathHasher + 'static) -> Self {
        Self {
            hasher: Box::new(hasher),
        }
    }

    /// Unify a raw path or hash token.
    ///
    /// Already-hashed names (with or without an extension) are returned in
    /// their lower-case token form. Anything else is hashed; if hashing fails
    /// the lower-cased literal path is used.
    pub fn unify(&self, raw: &str) -> UnifiedKey {
        let normalized = normalize_separators(raw);

        if is_hash_token(&normalized) {
            return UnifiedKey(normalized.to_ascii_lowercase());
        }
        if let Some((stem, _)) = normalized.split_once('.') {
            if is_hash_token(stem) {
                return UnifiedKey(stem.to_ascii_lowercase());
            }
        }

        let lowered = normalized.to_lowercase();
        match self.hasher.hash_token(&lowered) {
            Ok(token) => UnifiedKey(token.to_ascii_lowercase()),
            Err(e) => {
                debug!(path = %lowered, error = %e, "Falling back to literal unified key");
                UnifiedKey(lowered)
            }
        }
    }

    /// Hash a raw path with the underlying hasher (no hash-token detection).
    pub fn hash_token(&self, raw: &str) -> Result<String, HashError> {
        self.hasher
            .hash_token(&normalize_separators(raw).to_lowercase())
    }
}

impl Default for PathUnifier {
    fn default() -> Self {
        Self::new(Xxh64PathHasher)
    }
}
