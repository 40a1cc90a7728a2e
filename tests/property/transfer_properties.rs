//! Convergence of real transfers between local directories

use super::diff_properties::tree_strategy;
use ferry::{transfer, Entry, IgnoreFilter, LocalPlace, Place, TransferOptions};
use proptest::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Materialize `entry` at `path`; file content is its fingerprint text.
fn materialize(path: &Path, entry: &Entry) {
    match entry {
        Entry::File { fingerprint } => fs::write(path, fingerprint.as_str()).unwrap(),
        Entry::Dir { children } => {
            fs::create_dir_all(path).unwrap();
            for (name, child) in children {
                materialize(&path.join(name), child);
            }
        }
    }
}

fn snapshot(path: &Path) -> Option<Entry> {
    LocalPlace::new(path).traverse(&IgnoreFilter::none()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn forced_clean_transfer_converges(source in tree_strategy(), destination in tree_strategy()) {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        materialize(&src, &source);
        materialize(&dst, &destination);
        let options = TransferOptions {
            force: true,
            clean: true,
            ignore: IgnoreFilter::none(),
        };

        transfer(&LocalPlace::new(&src), &LocalPlace::new(&dst), &options, &()).unwrap();
        prop_assert_eq!(snapshot(&src), snapshot(&dst));

        let again = transfer(&LocalPlace::new(&src), &LocalPlace::new(&dst), &options, &()).unwrap();
        prop_assert!(again.is_empty());
    }
}
