use rowbase::prelude::*;

#[test]
fn a_deleted_row_is_gone_from_reads() {
    let store = Store::in_memory();
    let user = store
        .insert("users", Record::new().with("name", "ann"))
        .expect("insert");

    store.delete("users", &user).expect("delete");

    assert!(
        store
            .find_one("users", &Record::new().with("name", "ann"))
            .expect("find")
            .is_none()
    );
    assert_eq!(store.debug_info().live_records, 0);
}

#[test]
fn a_stale_handle_cannot_resurrect_a_deleted_row() {
    let store = Store::in_memory();
    let user = store
        .insert("users", Record::new().with("name", "ann"))
        .expect("insert");

    store.delete("users", &user).expect("delete");
    assert_eq!(store.debug_info().pending_tombstones, 1);

    user.write().unwrap().set("name", "zombie");
    store
        .commit("users", &user)
        .expect("committing a deleted record is not an error");

    assert!(store.find_one("users", &Record::new()).expect("find").is_none());
    assert_eq!(
        store.debug_info().pending_tombstones,
        0,
        "the commit consumed the tombstone"
    );
}

#[test]
fn the_tombstone_protects_exactly_one_commit() {
    let store = Store::in_memory();
    let user = store
        .insert("users", Record::new().with("name", "ann"))
        .expect("insert");
    store.delete("users", &user).expect("delete");

    store
        .commit("users", &user)
        .expect("the first commit consumes the tombstone and skips its write");
    store
        .commit("users", &user)
        .expect("the second commit writes normally");

    assert!(
        store
            .find_one("users", &Record::new())
            .expect("find")
            .is_some(),
        "with the tombstone spent, the second commit re-created the row"
    );
}

#[test]
fn deleting_flushes_pending_edits_of_other_records() {
    let store = Store::in_memory();
    let keep = store
        .insert("users", Record::new().with("name", "keep"))
        .expect("insert");
    let doomed = store
        .insert("users", Record::new().with("name", "doomed"))
        .expect("insert");

    keep.write().unwrap().set("name", "kept");
    store.delete("users", &doomed).expect("delete");

    let rows: Vec<_> = store
        .find_all("users", &Record::new())
        .expect("find_all")
        .collect::<Result<_>>()
        .expect("adopt");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].read().unwrap().get_as::<String>("name").unwrap(),
        "kept"
    );
}

#[test]
fn drop_table_forgets_records_and_tombstones() {
    let store = Store::in_memory();
    let user = store
        .insert("users", Record::new().with("name", "ann"))
        .expect("insert");
    store.delete("users", &user).expect("delete");
    store
        .insert("users", Record::new().with("name", "bee"))
        .expect("insert");

    store.drop_table("users").expect("drop");

    let info = store.debug_info();
    assert_eq!(info.live_records, 0);
    assert_eq!(info.pending_tombstones, 0);
    assert!(store.find_one("users", &Record::new()).expect("find").is_none());
}

#[test]
fn an_insert_after_drop_starts_clean() {
    let store = Store::in_memory();
    let first = store
        .insert("users", Record::new().with("name", "ann"))
        .expect("insert");
    store.delete("users", &first).expect("delete");
    store.drop_table("users").expect("drop");

    let fresh = store
        .insert("users", Record::new().with("name", "new"))
        .expect("insert");
    assert_eq!(
        fresh.read().unwrap().id(),
        Some(1),
        "the id sequence restarted with the table"
    );

    store.commit("users", &fresh).expect("commit");
    assert!(
        store
            .find_one("users", &Record::new().with("name", "new"))
            .expect("find")
            .is_some(),
        "no stale tombstone swallowed the write"
    );
}
