use std::collections::BTreeSet;

use proptest::prelude::*;
use valuetree::{InsertError, NodeIndex, Tree};

#[derive(Debug, Clone)]
enum Op {
    Insert { value: u8, parent: Option<u8> },
    Remove(u8),
}

fn op() -> impl Strategy<Value = Op> {
    // A small value range so that parents are found and duplicates are common.
    prop_oneof![
        3 => (0..16u8, proptest::option::weighted(0.9, 0..16u8))
            .prop_map(|(value, parent)| Op::Insert { value, parent }),
        1 => (0..16u8).prop_map(Op::Remove),
    ]
}

fn indices(tree: &Tree<u8>) -> BTreeSet<NodeIndex> {
    tree.iter().map(|node| node.index()).collect()
}

fn subtree(tree: &Tree<u8>, top: NodeIndex) -> BTreeSet<NodeIndex> {
    tree.iter()
        .filter(|node| node.index() == top || node.ancestors().any(|a| a.index() == top))
        .map(|node| node.index())
        .collect()
}

proptest! {
    #[test]
    fn operations_preserve_structure(ops in proptest::collection::vec(op(), 1..64)) {
        let mut tree = Tree::new();

        for op in ops {
            match op {
                Op::Insert { value, parent } => {
                    let was_empty = tree.is_empty();
                    let len = tree.len();

                    match tree.insert(value, parent.as_ref()) {
                        Ok(node) => {
                            prop_assert_eq!(tree.len(), len + 1);
                            prop_assert_eq!(*tree.node(node).unwrap().value(), value);
                            prop_assert_eq!(*tree.find(&value).unwrap().value(), value);
                            prop_assert_eq!(
                                tree.node(node).unwrap().parent().map(|p| *p.value()),
                                parent
                            );
                        }
                        Err(InsertError::ParentRequired) => {
                            prop_assert!(!was_empty && parent.is_none());
                            prop_assert_eq!(tree.len(), len);
                        }
                        Err(InsertError::ParentNotFound) => {
                            prop_assert!(parent.map_or(false, |p| !tree.contains(&p)));
                            prop_assert_eq!(tree.len(), len);
                        }
                        Err(err) => prop_assert!(false, "unexpected error {}", err),
                    }
                }
                Op::Remove(value) => {
                    let before = indices(&tree);
                    let target = tree.find_index(&value);
                    let doomed = target.map(|top| subtree(&tree, top)).unwrap_or_default();

                    prop_assert_eq!(tree.remove(&value), target.is_some());

                    let after = indices(&tree);
                    let expected: BTreeSet<_> = before.difference(&doomed).copied().collect();
                    prop_assert_eq!(&after, &expected);
                    for index in doomed {
                        prop_assert!(tree.node(index).is_none());
                    }
                }
            }

            prop_assert!(tree.validate().is_ok());
            prop_assert_eq!(tree.iter().count(), tree.len());
        }
    }

    #[test]
    fn parent_chain_matches_depth(ops in proptest::collection::vec(op(), 1..64)) {
        let mut tree = Tree::new();
        for op in ops {
            match op {
                Op::Insert { value, parent } => { let _ = tree.insert(value, parent.as_ref()); }
                Op::Remove(value) => { tree.remove(&value); }
            }
        }

        for node in tree.iter() {
            let first = tree.find(node.value()).unwrap();
            let chain: Vec<u8> = first.ancestors().map(|a| *a.value()).collect();
            let parents: Vec<u8> = tree.get_all_parents(node.value()).into_iter().copied().collect();

            prop_assert_eq!(parents.len(), first.depth());
            prop_assert_eq!(parents, chain);
        }
    }

    #[test]
    fn empty_tree_never_fails(value in any::<u8>()) {
        let mut tree = Tree::<u8>::new();

        prop_assert!(tree.find(&value).is_none());
        prop_assert!(!tree.remove(&value));
        prop_assert!(tree.get_all_parents(&value).is_empty());
        prop_assert_eq!(tree.insert(value, Some(&value)), Err(InsertError::ParentNotFound));
    }

    #[test]
    fn removing_one_duplicate_keeps_the_other(value in any::<u8>(), copies in 2..6usize) {
        let mut tree = Tree::new();
        let root = tree.insert(value.wrapping_add(1), None).unwrap();
        let twins: Vec<NodeIndex> = (0..copies)
            .map(|_| tree.insert_under(value, root).unwrap())
            .collect();

        prop_assert!(tree.remove(&value));
        prop_assert!(tree.node(twins[0]).is_none());
        for &twin in &twins[1..] {
            prop_assert_eq!(*tree.node(twin).unwrap().value(), value);
        }
        prop_assert_eq!(tree.find_index(&value), Some(twins[1]));
    }
}
