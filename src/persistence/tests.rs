use tempfile::tempdir;

use super::{MembershipOracle, MemoryStore, MessageStore, SledStore, StoreError};
use crate::hub::message::{Message, Target};

fn message(sender_id: i64, target: Target, content: &str) -> Message {
    Message {
        sender_id,
        target,
        content: content.to_string(),
    }
}

#[test]
fn test_sled_membership() {
    let dir = tempdir().unwrap();
    let store = SledStore::open(dir.path().to_str().unwrap()).unwrap();

    assert!(store.add_member(5, 1).unwrap());
    assert!(!store.add_member(5, 1).unwrap());
    store.add_member(5, 2).unwrap();
    store.add_member(6, 3).unwrap();

    assert!(store.is_member(1, 5).unwrap());
    assert!(!store.is_member(3, 5).unwrap());
    assert_eq!(store.members(5).unwrap(), vec![1, 2]);

    assert!(store.remove_member(5, 1).unwrap());
    assert!(!store.remove_member(5, 1).unwrap());
    assert!(!store.is_member(1, 5).unwrap());
}

#[test]
fn test_sled_append_assigns_id_and_timestamp() {
    let dir = tempdir().unwrap();
    let store = SledStore::open(dir.path().to_str().unwrap()).unwrap();
    let before = chrono::Utc::now();

    store.append(&message(1, Target::Room(5), "hi")).unwrap();
    store.append(&message(1, Target::Direct(2), "hey")).unwrap();

    let stored = store.stored_messages().unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored[0].id < stored[1].id);

    assert_eq!(stored[0].sender_id, 1);
    assert_eq!(stored[0].room_id, Some(5));
    assert_eq!(stored[0].recipient_id, None);
    assert_eq!(stored[0].content, "hi");
    assert!(stored[0].timestamp >= before);

    assert_eq!(stored[1].recipient_id, Some(2));
    assert_eq!(stored[1].room_id, None);
}

#[test]
fn test_sled_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().to_str().unwrap().to_string();
    {
        let store = SledStore::open(&path).unwrap();
        store.add_member(5, 1).unwrap();
        store.append(&message(1, Target::Room(5), "kept")).unwrap();
        store.flush().unwrap();
    }

    let store = SledStore::open(&path).unwrap();
    assert!(store.is_member(1, 5).unwrap());
    assert_eq!(store.stored_messages().unwrap()[0].content, "kept");
}

#[test]
fn test_memory_store_records_appends() {
    let store = MemoryStore::new();
    store.add_member(5, 1);
    assert!(store.is_member(1, 5).unwrap());
    assert!(store.remove_member(5, 1));
    assert!(!store.is_member(1, 5).unwrap());

    let msg = message(1, Target::Room(5), "hi");
    store.append(&msg).unwrap();

    store.set_fail_appends(true);
    assert!(matches!(store.append(&msg), Err(StoreError::Unavailable(_))));
    assert_eq!(store.appended().len(), 2);
}
