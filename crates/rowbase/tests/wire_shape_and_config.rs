use serde_json::json;

use rowbase::prelude::*;

#[test]
fn records_serialize_to_a_flat_column_map() {
    let record = Record::new()
        .with("name", "ann")
        .with("age", 34i64)
        .with("active", true)
        .with("note", Value::Null);

    let wire = serde_json::to_value(&record).expect("serialize");
    assert_eq!(
        wire,
        json!({"name": "ann", "age": 34, "active": true, "note": null})
    );
}

#[test]
fn the_id_appears_in_the_map_once_assigned() {
    let store = Store::in_memory();
    let user = store
        .insert("users", Record::new().with("name", "ann"))
        .expect("insert");

    let wire = serde_json::to_value(&*user.read().unwrap()).expect("serialize");
    assert_eq!(wire, json!({"id": 1, "name": "ann"}));
}

#[test]
fn records_parse_from_the_flat_map() {
    let record: Record =
        serde_json::from_value(json!({"id": 3, "name": "ann", "age": 34})).expect("parse");

    assert_eq!(record.id(), Some(3));
    assert_eq!(record.get_as::<String>("name").unwrap(), "ann");
    assert_eq!(record.get_as::<i64>("age").unwrap(), 34);
}

#[test]
fn an_absent_location_defaults_to_the_temp_dir() {
    let store = Store::from_uri(None);
    let expected = std::env::temp_dir().join("rowbase.db");
    assert_eq!(store.manager().path(), expected.to_string_lossy());
}

#[test]
fn sqlite_uris_resolve_like_paths() {
    let store = Store::from_uri(Some("sqlite://:memory:"));
    assert_eq!(store.manager().path(), ":memory:");

    store
        .insert("t", Record::new().with("x", 1i64))
        .expect("insert works on the resolved location");
}

#[test]
fn data_survives_reopening_a_file_backed_store() {
    let path = std::env::temp_dir().join("rowbase_reopen_test.db");
    let _ = std::fs::remove_file(&path);
    let location = path.to_string_lossy().into_owned();

    {
        let store = Store::new(SqliteConfig::file(location.clone()));
        let user = store
            .insert("users", Record::new().with("name", "ann"))
            .expect("insert");
        store.commit("users", &user).expect("commit");
    }

    let store = Store::new(SqliteConfig::file(location));
    let user = store
        .find_one("users", &Record::new().with("name", "ann"))
        .expect("find")
        .expect("row survived the restart");
    assert_eq!(user.read().unwrap().id(), Some(1));

    drop(store);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn reconfiguring_points_the_store_at_a_new_database() {
    let store = Store::in_memory();
    let user = store
        .insert("users", Record::new().with("name", "ann"))
        .expect("insert");
    store.commit("users", &user).expect("commit");

    store.manager().reconfigure(SqliteConfig::memory());

    assert!(
        store.find_one("users", &Record::new()).expect("find").is_none(),
        "the next use opened the new, empty database"
    );
}

#[test]
fn a_bad_location_fails_fast_with_a_config_error() {
    let store = Store::new(SqliteConfig::file("/nonexistent-rowbase-dir/db.sqlite"));
    let err = store
        .insert("users", Record::new().with("name", "ann"))
        .expect_err("the open fails");
    assert!(err.is_config(), "a failed open is fatal, not a backend error");
}
