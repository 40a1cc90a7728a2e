//! Properties of the diff between two tree snapshots

use ferry::{diff, Entry, Fingerprint, Route};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Small trees over a tiny name alphabet, so generated pairs overlap often.
pub fn tree_strategy() -> impl Strategy<Value = Entry> {
    let leaf = "[x-z]".prop_map(|content| Entry::file(Fingerprint::new(content)));
    let tree = leaf.prop_recursive(3, 32, 4, |inner| {
        prop::collection::btree_map("[a-d]", inner, 0..4)
            .prop_map(|children| Entry::Dir { children })
    });
    prop::collection::btree_map("[a-d]", tree, 0..4).prop_map(|children| Entry::Dir { children })
}

fn count(entry: &Entry) -> (usize, usize) {
    match entry {
        Entry::File { .. } => (0, 1),
        Entry::Dir { children } => children.values().map(count).fold((1, 0), |(dirs, files), (d, f)| {
            (dirs + d, files + f)
        }),
    }
}

fn position(routes: &[Route]) -> HashMap<&Route, usize> {
    routes.iter().enumerate().map(|(i, route)| (route, i)).collect()
}

proptest! {
    #[test]
    fn diff_against_itself_is_empty(tree in tree_strategy(), clean in any::<bool>()) {
        prop_assert!(diff(&tree, Some(&tree), clean).is_empty());
    }

    #[test]
    fn absent_destination_schedules_whole_source(tree in tree_strategy(), clean in any::<bool>()) {
        let result = diff(&tree, None, clean);
        let (dirs, files) = count(&tree);

        prop_assert_eq!(result.create.len(), dirs);
        prop_assert_eq!(result.save.len(), files);
        prop_assert!(result.delete.is_empty());
        prop_assert_eq!(&result.create[0], &Route::root());
    }

    #[test]
    fn deletes_are_never_nested(source in tree_strategy(), destination in tree_strategy()) {
        let result = diff(&source, Some(&destination), true);
        for outer in &result.delete {
            for inner in &result.delete {
                prop_assert!(outer == inner || !inner.starts_with(outer));
            }
        }
    }

    #[test]
    fn without_clean_deletes_only_flip_types(source in tree_strategy(), destination in tree_strategy()) {
        let result = diff(&source, Some(&destination), false);
        for route in &result.delete {
            prop_assert!(result.create.contains(route) || result.save.contains(route));
        }
    }

    #[test]
    fn created_parents_precede_their_children(source in tree_strategy(), destination in tree_strategy()) {
        let result = diff(&source, Some(&destination), true);
        let created = position(&result.create);
        for (route, index) in &created {
            if let Some(parent) = route.parent() {
                if let Some(parent_index) = created.get(&parent) {
                    prop_assert!(parent_index < index);
                }
            }
        }
        for route in &result.save {
            if let Some(parent) = route.parent() {
                prop_assert!(source.lookup(&parent).map(Entry::is_dir).unwrap_or(false));
            }
        }
    }

    #[test]
    fn every_route_is_listed_once(source in tree_strategy(), destination in tree_strategy()) {
        let result = diff(&source, Some(&destination), true);
        let mut seen: BTreeMap<&Route, usize> = BTreeMap::new();
        for route in result.create.iter().chain(&result.save) {
            *seen.entry(route).or_default() += 1;
        }
        prop_assert!(seen.values().all(|&n| n == 1));
    }
}
