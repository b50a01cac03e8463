//! Record store behaviour seen from outside the crate

use std::time::{Duration, SystemTime};

use aacbridge::core::errors::StoreError;
use aacbridge::core::types::{ChatMessage, SessionStyle};
use aacbridge::storage::{ArtifactStore, ChatStore};
use proptest::prelude::*;
use tempfile::TempDir;

fn set_age(store: &ArtifactStore, name: &str, secs_ago: u64) {
    let file = std::fs::File::options()
        .write(true)
        .open(store.dir().join(format!("{name}.txt")))
        .unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
        .unwrap();
}

#[test]
fn test_ciao_mondo_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::new(temp.path().join("artifacts")).unwrap();

    assert_eq!(store.save("Ciao mondo", None).unwrap(), "Ciao mondo");
    assert_eq!(store.save("Ciao mondo", None).unwrap(), "Ciao mondo_1");
    assert_eq!(store.count().unwrap(), 2);

    let listing = store.format_listing().unwrap();
    assert!(listing.starts_with("Ecco gli artefatti salvati"));
    assert!(listing.contains("Ciao mondo_1"));
}

#[test]
fn test_out_of_range_carries_count() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::new(temp.path()).unwrap();
    store.save("Una nota breve", None).unwrap();

    for rank in [0, 2] {
        match store.get_by_number(rank) {
            Err(StoreError::OutOfRange { requested, count }) => {
                assert_eq!(requested, rank);
                assert_eq!(count, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn test_corrupt_chat_is_skipped_in_listing() {
    let temp = TempDir::new().unwrap();
    let store = ChatStore::new(temp.path()).unwrap();
    let history = vec![
        ChatMessage::user("CIAO"),
        ChatMessage::assistant("Ciao, come stai oggi?"),
    ];
    store
        .save(SessionStyle::Chat, &history, Some("Saluti"))
        .unwrap();
    std::fs::write(temp.path().join("rotta.json"), "{ not json").unwrap();

    let entries = store.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Saluti");
    assert_eq!(entries[0].style, Some(SessionStyle::Chat));
}

#[test]
fn test_delete_then_ranks_shift() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::new(temp.path()).unwrap();
    for (title, age) in [("vecchio testo", 300), ("medio testo", 200), ("nuovo testo", 100)] {
        store.save("contenuto di prova", Some(title)).unwrap();
        set_age(&store, title, age);
    }

    assert_eq!(store.delete_by_number(1).unwrap(), "nuovo testo");
    assert_eq!(store.get_by_number(1).unwrap().name, "medio testo");
    assert!(!store.delete("nuovo testo").unwrap());
}

#[test]
fn test_unaged_saves_rank_in_save_order() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::new(temp.path()).unwrap();

    store.save("primo testo salvato", Some("aaa titolo")).unwrap();
    store.save("secondo testo salvato", Some("zzz titolo")).unwrap();
    store.save("terzo testo salvato", Some("mmm titolo")).unwrap();

    assert_eq!(store.get_by_number(1).unwrap().name, "mmm titolo");
    assert_eq!(store.get_by_number(2).unwrap().name, "zzz titolo");
    assert_eq!(store.get_by_number(3).unwrap().name, "aaa titolo");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn rank_one_is_always_the_newest(ages in prop::collection::hash_set(1u64..100_000, 1..6)) {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path()).unwrap();

        let ages: Vec<u64> = ages.into_iter().collect();
        for (i, age) in ages.iter().enumerate() {
            let name = format!("testo {i}");
            store.save("contenuto", Some(&name)).unwrap();
            set_age(&store, &name, *age);
        }

        let entries = store.list().unwrap();
        prop_assert_eq!(entries.len(), ages.len());
        for pair in entries.windows(2) {
            prop_assert!(pair[0].saved_at >= pair[1].saved_at);
        }

        let youngest = ages.iter().enumerate().min_by_key(|(_, a)| **a).map(|(i, _)| i).unwrap();
        prop_assert_eq!(store.get_by_number(1).unwrap().name, format!("testo {youngest}"));
    }
}
