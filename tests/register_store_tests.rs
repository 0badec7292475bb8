//! Integration tests for the in-process register table

use std::path::Path;

use regsync::{
    registers::{canonicalize, name::all_names, BLACKHOLE, NUM_REGISTERS, UNNAMED},
    RegSyncError, RegisterStore,
};
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    fn files(store: &RegisterStore, name: char) -> Vec<String> {
        store.find(name).map(|reg| reg.to_vec()).unwrap_or_default()
    }

    #[test]
    fn test_exists_and_find() {
        let store = RegisterStore::new();

        assert_eq!(all_names().filter(|&name| store.exists(name)).count(), NUM_REGISTERS + 26);
        assert!(store.exists('Q'));
        assert!(store.find('Q').is_none());
        assert_eq!(store.find('q').unwrap().name(), 'q');
        assert!(!store.exists('1'));
        assert!(store.find('1').is_none());

        assert_eq!(canonicalize('Q'), canonicalize('q'));
        assert_eq!(canonicalize('!'), None);
    }

    #[test]
    fn test_append_rules() {
        let mut store = RegisterStore::new();

        assert!(store.append('a', "/tmp/a"));
        assert!(!store.append('a', "/tmp/a"));
        assert!(store.append('a', "/tmp/b"));
        assert!(store.append(BLACKHOLE, "/tmp/a"));
        assert!(!store.append('A', "/tmp/c"));
        assert!(!store.append('%', "/tmp/c"));

        assert_eq!(files(&store, 'a'), ["/tmp/a", "/tmp/b"]);
        assert!(store.find(BLACKHOLE).unwrap().is_empty());
    }

    #[test]
    fn test_try_append_explains_refusal() {
        let mut store = RegisterStore::new();
        store.append('a', "/x");

        let err = store.try_append('a', "/x").unwrap_err();
        assert!(matches!(err, RegSyncError::InvalidRegister { name: 'a', .. }));
        assert!(store.try_append('a', "/with\0nul").is_err());
        assert!(store.try_append('A', "/y").is_err());
    }

    #[test]
    fn test_no_duplicates_after_mixed_operations() {
        let mut store = RegisterStore::new();
        for round in 0..5 {
            for i in 0..20 {
                store.append('m', &format!("/p/{}", i % 7));
            }
            if round % 2 == 1 {
                store.tombstone('m', 0);
                store.pack('m');
            }
            if round == 3 {
                store.clear('m');
            }
        }

        let mut entries = files(&store, 'm');
        let len = entries.len();
        entries.sort();
        entries.dedup();
        assert_eq!(entries.len(), len);
    }

    #[test]
    fn test_clear_and_reset() {
        let mut store = RegisterStore::new();
        store.append('a', "/a");
        store.append('b', "/b");

        store.clear('a');
        assert!(store.find('a').unwrap().is_empty());
        assert_eq!(files(&store, 'b'), ["/b"]);

        store.reset();
        assert!(store.iter().all(|reg| reg.is_empty()));
    }

    #[test]
    fn test_pack_preserves_order() {
        let mut store = RegisterStore::new();
        for path in ["/1", "/2", "/3", "/4"] {
            store.append('p', path);
        }

        assert_eq!(store.tombstone('p', 1).as_deref(), Some("/2"));
        assert_eq!(store.tombstone('p', 3).as_deref(), Some("/4"));
        assert_eq!(store.find('p').unwrap().len(), 2);
        store.pack('p');
        assert_eq!(files(&store, 'p'), ["/1", "/3"]);
    }

    #[test]
    fn test_list_order() {
        let mut store = RegisterStore::new();
        store.append('a', "/a1");
        store.append('a', "/a2");
        store.append('c', "/c1");

        assert_eq!(store.list("cba"), ["\"c", "/c1", "\"a", "/a2", "/a1"]);
        assert!(store.list("bA").is_empty());
    }

    #[test]
    fn test_rename_contents() {
        let mut store = RegisterStore::new();
        store.append('a', "/tmp/a");
        store.append('b', "/tmp/x");
        store.append('b', "/tmp/a");
        store.append('c', "/tmp/c");

        store.rename_contents("/tmp/a", "/tmp/a2");
        assert_eq!(files(&store, 'a'), ["/tmp/a2"]);
        assert_eq!(files(&store, 'b'), ["/tmp/x", "/tmp/a2"]);
        assert_eq!(files(&store, 'c'), ["/tmp/c"]);
    }

    #[test]
    fn test_remove_stale_trashed_entries() {
        let trash = TempDir::new().unwrap();
        let present = trash.path().join("present");
        std::fs::write(&present, b"data").unwrap();
        let gone = trash.path().join("gone");
        let outside = "/nonexistent/outside/trash";

        let mut store = RegisterStore::new();
        store.append('a', present.to_str().unwrap());
        store.append('a', gone.to_str().unwrap());
        store.append('a', outside);
        store.append('b', gone.to_str().unwrap());

        store.remove_stale_trashed_entries(trash.path());
        assert_eq!(files(&store, 'a'), [present.to_str().unwrap(), outside]);
        assert!(store.find('b').unwrap().is_empty());
    }

    #[test]
    fn test_copy_into_unnamed() {
        let mut store = RegisterStore::new();
        store.append(UNNAMED, "/old");
        store.append('a', "/a1");
        store.append('a', "/a2");

        store.copy_into_unnamed('a');
        assert_eq!(files(&store, UNNAMED), ["/a1", "/a2"]);
        assert_eq!(files(&store, 'a'), ["/a1", "/a2"]);

        store.copy_into_unnamed(UNNAMED);
        store.copy_into_unnamed('A');
        assert_eq!(files(&store, UNNAMED), ["/a1", "/a2"]);
    }

    #[test]
    fn test_suggest_labels_most_recent() {
        let mut store = RegisterStore::new();
        store.append('a', "/home/me/one");
        store.append('a', "/home/me/two");
        store.append('a', "/srv/three");
        store.append('b', "/b");

        let mut seen = Vec::new();
        store.suggest_with_home("ab", 2, Some(Path::new("/home/me")), |label, value| {
            seen.push((label.to_string(), value.to_string()));
        });

        assert_eq!(
            seen,
            [
                ("reg: a".to_string(), "/srv/three".to_string()),
                (String::new(), "~/two".to_string()),
                ("reg: b".to_string(), "/b".to_string()),
            ]
        );
    }
}
