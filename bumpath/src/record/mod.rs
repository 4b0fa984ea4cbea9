//! Typed record model for decoded containers.
//!
//! A [`Container`] is what the container codec hands the engine: an ordered
//! list of links to other containers plus an ordered list of [`Record`]s.
//! Each record holds a [`FieldTree`], a closed tagged-variant tree whose
//! structural variants drive traversal:
//!
//! ```text
//! FieldTree
//! ├── Scalar       (kind, value)          leaf; only path-capable strings matter
//! ├── Sequence     (element kind, items)  list and list2 encodings
//! ├── Associative  (key/value kinds, pairs)
//! ├── Aggregate    (class, children?)     embed and pointer; absent children is terminal
//! └── Optional     (kind, value?)
//! ```
//!
//! New scalar kinds can be added to [`FieldKind`] without touching the
//! walkers in this module.

mod model;
mod walk;

pub use model::{Container, Field, FieldKind, FieldTree, Record, RecordKey, ScalarValue};
