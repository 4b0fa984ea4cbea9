//! Bumpath - asset repathing for game data containers
//!
//! This library rewrites the asset references inside interlinked data
//! containers so that several independently authored mod packages can be
//! installed together without their asset paths colliding.
//!
//! A session runs in three phases:
//!
//! 1. **Scan**: index the source directories ([`overlay`]), decode the
//!    selected containers and follow their links ([`scan`]), recording which
//!    asset references exist.
//! 2. **Rewrite**: copy every present asset to a prefixed location and
//!    rewrite the copied containers to match ([`rewrite`]).
//! 3. **Merge** (optional): fold each root container's linked closure into
//!    the root itself ([`merge`]).
//!
//! [`engine::BumpathEngine`] drives the phases and owns the session state;
//! [`batch`] runs one session per package.

pub mod batch;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod hashtables;
pub mod logging;
pub mod merge;
pub mod overlay;
pub mod record;
pub mod rewrite;
pub mod scan;
pub mod settings;
pub mod unify;

pub use engine::{BumOptions, BumReport, BumpathEngine, ScanReport};
pub use error::{BumError, BumResult};
pub use unify::{PathUnifier, UnifiedKey};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
