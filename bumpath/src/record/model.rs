//! Record, field and container types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a record.
///
/// Used both for display (via hash table reverse lookup) and for
/// deduplicating records when containers are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(pub u32);

impl RecordKey {
    /// Compute the key for a record path name.
    ///
    /// Record keys are the 32-bit FNV-1a hash of the lower-cased name.
    ///
    /// ```
    /// use bumpath::record::RecordKey;
    ///
    /// assert_eq!(RecordKey::from_name(""), RecordKey(0x811c9dc5));
    /// assert_eq!(
    ///     RecordKey::from_name("Characters/Ahri/Skins/Skin0"),
    ///     RecordKey::from_name("characters/ahri/skins/skin0")
    /// );
    /// ```
    pub fn from_name(name: &str) -> Self {
        let mut hash: u32 = 0x811c9dc5;
        for byte in name.to_ascii_lowercase().bytes() {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(0x0100_0193);
        }
        Self(hash)
    }

    /// Deterministic placeholder used when no display name is known.
    pub fn placeholder(&self) -> String {
        format!("{:08x}", self.0)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Value type tag carried by scalar leaves and container nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    None,
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    Vec2,
    Vec3,
    Vec4,
    Mtx44,
    Rgba,
    String,
    Hash,
    File,
    List,
    List2,
    Pointer,
    Embed,
    Link,
    Option,
    Map,
    Flag,
}

impl FieldKind {
    /// Check if values of this kind may hold an asset path.
    pub fn is_path_capable(&self) -> bool {
        matches!(self, FieldKind::String)
    }
}

/// Payload of a scalar leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarValue {
    None,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f32),
    Floats(Vec<f32>),
    Text(String),
    Hash(u64),
}

/// A node of a record's field tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum FieldTree {
    /// Leaf value.
    Scalar { kind: FieldKind, value: ScalarValue },

    /// Ordered list. `wide` marks the double-width list encoding.
    Sequence {
        element_kind: FieldKind,
        #[serde(default)]
        wide: bool,
        elements: Vec<FieldTree>,
    },

    /// Ordered key/value pairs.
    Associative {
        key_kind: FieldKind,
        value_kind: FieldKind,
        pairs: Vec<(FieldTree, FieldTree)>,
    },

    /// Nested field group, inline (embed) or `shared` (pointer).
    ///
    /// `children: None` is a null pointer and is a valid leaf.
    Aggregate {
        #[serde(default)]
        shared: bool,
        class_hash: u32,
        children: Option<Vec<Field>>,
    },

    /// Optional value.
    Optional {
        value_kind: FieldKind,
        value: Option<Box<FieldTree>>,
    },
}

impl FieldTree {
    /// Create a path-capable string leaf.
    pub fn string(value: impl Into<String>) -> Self {
        FieldTree::Scalar {
            kind: FieldKind::String,
            value: ScalarValue::Text(value.into()),
        }
    }

    /// Create an inline embedded field group.
    pub fn embed(class_hash: u32, children: Vec<Field>) -> Self {
        FieldTree::Aggregate {
            shared: false,
            class_hash,
            children: Some(children),
        }
    }

    /// Create a pointer field group; `None` is a null pointer.
    pub fn pointer(class_hash: u32, children: Option<Vec<Field>>) -> Self {
        FieldTree::Aggregate {
            shared: true,
            class_hash,
            children,
        }
    }

    /// Create a single-width list.
    pub fn list(element_kind: FieldKind, elements: Vec<FieldTree>) -> Self {
        FieldTree::Sequence {
            element_kind,
            wide: false,
            elements,
        }
    }
}

/// A named child of an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Hashed field name.
    pub name_hash: u32,
    pub value: FieldTree,
}

impl Field {
    pub fn new(name_hash: u32, value: FieldTree) -> Self {
        Self { name_hash, value }
    }
}

/// One keyed entry of a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    pub tree: FieldTree,
}

impl Record {
    /// Create a record whose body is an embedded field group of `class_hash`.
    pub fn new(key: RecordKey, class_hash: u32, fields: Vec<Field>) -> Self {
        Self {
            key,
            tree: FieldTree::embed(class_hash, fields),
        }
    }

    /// Class hash of the record body, if it is an aggregate.
    pub fn class_hash(&self) -> Option<u32> {
        match &self.tree {
            FieldTree::Aggregate { class_hash, .. } => Some(*class_hash),
            _ => None,
        }
    }
}

/// A decoded container: links to other containers plus records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Raw references to containers this one depends on.
    #[serde(default)]
    pub links: Vec<String>,

    #[serde(default)]
    pub records: Vec<Record>,
}

impl Container {
    pub fn new(links: Vec<String>, records: Vec<Record>) -> Self {
        Self { links, records }
    }
}
