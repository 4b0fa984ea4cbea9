//! Prefix rewriting.
//!
//! Every present reference is copied to a prefixed location under the output
//! root and every copied container has its own string values rewritten to
//! point at the prefixed copies.
//!
//! # Path Rule
//!
//! ```text
//! assets/characters/ahri/ahri.dds  + "bum7"  ->  assets/bum7/characters/ahri/ahri.dds
//! plainname                        + "x"     ->  x/plainname
//! data/characters/ahri/ahri.bin    (container, never prefixed)
//! ```
//!
//! Output file names longer than [`MAX_FILE_NAME_LEN`] are replaced by the
//! hash token of the prefixed path plus the original extension, placed
//! directly under the output root.

mod paths;
mod rewriter;

pub use paths::{output_location, prefix_path, remove_empty_dirs, MAX_FILE_NAME_LEN};
pub use rewriter::{PrefixRewriter, RewriteOptions, RewriteOutcome};
