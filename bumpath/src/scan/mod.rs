//! Reference scanning.
//!
//! The scanner decodes each selected container, follows its links into
//! dependency containers (depth-first, each container at most once per
//! session) and records every asset reference it finds, per record.
//!
//! # Output
//!
//! ```text
//! ScanState
//! ├── records          RecordKey -> ScannedRecord { prefix, references }
//! │                    references: UnifiedKey -> Reference { exists, raw }
//! ├── all_containers   UnifiedKey -> Reference   (every link and root seen)
//! └── links            LinkGraph: container -> present linked containers
//! ```
//!
//! Self-skin links (a character container linking to its own per-skin
//! sibling) are never followed or recorded.

mod graph;
mod scanner;
mod state;

pub use graph::LinkGraph;
pub use scanner::{is_self_skin_link, ReferenceScanner};
pub use state::{Reference, ScanEntry, ScanState, ScannedRecord};
