//! Depth-first walks over field trees.
//!
//! Only the five structural variants drive recursion; the visitor sees every
//! path-capable string leaf reachable through any nesting.

use super::model::{FieldTree, ScalarValue};

impl FieldTree {
    /// Visit every path-capable string leaf under this node.
    pub fn for_each_path_string<F: FnMut(&str)>(&self, visit: &mut F) {
        match self {
            FieldTree::Scalar { kind, value } => {
                if kind.is_path_capable() {
                    if let ScalarValue::Text(text) = value {
                        visit(text);
                    }
                }
            }
            FieldTree::Sequence { elements, .. } => {
                for element in elements {
                    element.for_each_path_string(visit);
                }
            }
            FieldTree::Associative { pairs, .. } => {
                for (key, value) in pairs {
                    key.for_each_path_string(visit);
                    value.for_each_path_string(visit);
                }
            }
            FieldTree::Aggregate { children, .. } => {
                if let Some(children) = children {
                    for field in children {
                        field.value.for_each_path_string(visit);
                    }
                }
            }
            FieldTree::Optional { value, .. } => {
                if let Some(value) = value {
                    value.for_each_path_string(visit);
                }
            }
        }
    }

    /// Visit every path-capable string leaf mutably.
    pub fn for_each_path_string_mut<F: FnMut(&mut String)>(&mut self, visit: &mut F) {
        match self {
            FieldTree::Scalar { kind, value } => {
                if kind.is_path_capable() {
                    if let ScalarValue::Text(text) = value {
                        visit(text);
                    }
                }
            }
            FieldTree::Sequence { elements, .. } => {
                for element in elements {
                    element.for_each_path_string_mut(visit);
                }
            }
            FieldTree::Associative { pairs, .. } => {
                for (key, value) in pairs {
                    key.for_each_path_string_mut(visit);
                    value.for_each_path_string_mut(visit);
                }
            }
            FieldTree::Aggregate { children, .. } => {
                if let Some(children) = children {
                    for field in children {
                        field.value.for_each_path_string_mut(visit);
                    }
                }
            }
            FieldTree::Optional { value, .. } => {
                if let Some(value) = value {
                    value.for_each_path_string_mut(visit);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::model::{Field, FieldKind, FieldTree, ScalarValue};

    fn collect(tree: &FieldTree) -> Vec<String> {
        let mut out = Vec::new();
        tree.for_each_path_string(&mut |s| out.push(s.to_string()));
        out
    }

    fn nested_tree() -> FieldTree {
        FieldTree::embed(
            1,
            vec![
                Field::new(10, FieldTree::string("assets/top.dds")),
                Field::new(
                    11,
                    FieldTree::Scalar {
                        kind: FieldKind::U32,
                        value: ScalarValue::UInt(5),
                    },
                ),
                Field::new(
                    12,
                    FieldTree::Sequence {
                        element_kind: FieldKind::Embed,
                        wide: true,
                        elements: vec![FieldTree::embed(
                            2,
                            vec![Field::new(20, FieldTree::string("assets/in_list2.dds"))],
                        )],
                    },
                ),
                Field::new(
                    13,
                    FieldTree::Associative {
                        key_kind: FieldKind::String,
                        value_kind: FieldKind::Pointer,
                        pairs: vec![(
                            FieldTree::string("assets/map_key.dds"),
                            FieldTree::pointer(
                                3,
                                Some(vec![Field::new(
                                    30,
                                    FieldTree::Optional {
                                        value_kind: FieldKind::String,
                                        value: Some(Box::new(FieldTree::string(
                                            "assets/deep.dds",
                                        ))),
                                    },
                                )]),
                            ),
                        )],
                    },
                ),
                Field::new(14, FieldTree::pointer(4, None)),
                Field::new(
                    15,
                    FieldTree::Optional {
                        value_kind: FieldKind::String,
                        value: None,
                    },
                ),
                Field::new(
                    16,
                    FieldTree::Scalar {
                        kind: FieldKind::Hash,
                        value: ScalarValue::Text("assets/not_a_path_kind.dds".to_string()),
                    },
                ),
            ],
        )
    }

    #[test]
    fn test_walk_reaches_every_nested_string() {
        let paths = collect(&nested_tree());
        assert_eq!(
            paths,
            vec![
                "assets/top.dds",
                "assets/in_list2.dds",
                "assets/map_key.dds",
                "assets/deep.dds",
            ]
        );
    }

    #[test]
    fn test_walk_ignores_non_path_kinds() {
        let paths = collect(&nested_tree());
        assert!(!paths.iter().any(|p| p.contains("not_a_path_kind")));
    }

    #[test]
    fn test_mutable_walk_rewrites_in_place() {
        let mut tree = nested_tree();
        tree.for_each_path_string_mut(&mut |s| *s = s.to_uppercase());

        let paths = collect(&tree);
        assert!(paths.contains(&"ASSETS/DEEP.DDS".to_string()));
        assert!(paths.contains(&"ASSETS/MAP_KEY.DDS".to_string()));
        assert_eq!(paths.len(), 4);
    }

    #[test]
    fn test_both_walks_visit_the_same_leaves() {
        let mut tree = nested_tree();
        let mut seen_mut = Vec::new();
        tree.for_each_path_string_mut(&mut |s| seen_mut.push(s.clone()));

        assert_eq!(seen_mut, collect(&tree));
    }

    #[test]
    fn test_null_pointer_is_terminal() {
        let tree = FieldTree::pointer(9, None);
        assert!(collect(&tree).is_empty());
    }
}
