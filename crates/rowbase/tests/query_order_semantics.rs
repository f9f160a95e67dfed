use rowbase::prelude::*;

fn seed(store: &Store) {
    for (name, age) in [("ann", 34i64), ("bee", 21i64), ("cal", 55i64), ("dot", 41i64)] {
        store
            .insert("users", Record::new().with("name", name).with("age", age))
            .expect("insert");
    }
}

fn ages(handles: &[RecordHandle]) -> Vec<i64> {
    handles
        .iter()
        .map(|h| h.read().unwrap().get_as::<i64>("age").unwrap())
        .collect()
}

#[test]
fn order_by_sorts_ascending_by_default() {
    let store = Store::in_memory();
    seed(&store);

    let rows: Vec<_> = store
        .find_all_with("users", &Record::new(), FindOptions::new().order_by("age"))
        .expect("find_all")
        .collect::<Result<_>>()
        .expect("adopt");
    assert_eq!(ages(&rows), vec![21, 34, 41, 55]);
}

#[test]
fn reverse_flips_the_order() {
    let store = Store::in_memory();
    seed(&store);

    let rows: Vec<_> = store
        .find_all_with(
            "users",
            &Record::new(),
            FindOptions::new().order_by("age").reverse(true),
        )
        .expect("find_all")
        .collect::<Result<_>>()
        .expect("adopt");
    assert_eq!(ages(&rows), vec![55, 41, 34, 21]);
}

#[test]
fn reverse_without_a_column_means_newest_first() {
    let store = Store::in_memory();
    seed(&store);

    let ids: Vec<i64> = store
        .find_all_with("users", &Record::new(), FindOptions::new().reverse(true))
        .expect("find_all")
        .map(|h| h.expect("adopt").read().unwrap().id().unwrap())
        .collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
}

#[test]
fn reserved_predicate_keys_still_steer_the_query() {
    let store = Store::in_memory();
    seed(&store);

    let predicate = Record::new().with("_orderBy", "age").with("_reverse", true);
    let rows: Vec<_> = store
        .find_all("users", &predicate)
        .expect("find_all")
        .collect::<Result<_>>()
        .expect("adopt");
    assert_eq!(ages(&rows), vec![55, 41, 34, 21]);
}

#[test]
fn reserved_keys_never_reach_the_backend_as_filters() {
    let store = Store::in_memory();
    seed(&store);

    // No column called `_reverse` exists; if the key leaked into the WHERE
    // clause this query would error instead of matching everything.
    let rows: Vec<_> = store
        .find_all("users", &Record::new().with("_reverse", false))
        .expect("find_all")
        .collect::<Result<_>>()
        .expect("adopt");
    assert_eq!(rows.len(), 4);
}

#[test]
fn find_one_returns_the_first_match_under_the_requested_order() {
    let store = Store::in_memory();
    seed(&store);

    let oldest = store
        .find_one_with(
            "users",
            &Record::new(),
            FindOptions::new().order_by("age").reverse(true),
        )
        .expect("find_one")
        .expect("row");
    assert_eq!(
        oldest.read().unwrap().get_as::<String>("name").unwrap(),
        "cal"
    );
}

#[test]
fn predicates_are_equality_filters_over_all_given_fields() {
    let store = Store::in_memory();
    store
        .insert("pets", Record::new().with("kind", "cat").with("name", "momo"))
        .expect("insert");
    store
        .insert("pets", Record::new().with("kind", "cat").with("name", "pixel"))
        .expect("insert");
    store
        .insert("pets", Record::new().with("kind", "dog").with("name", "rex"))
        .expect("insert");

    let cats: Vec<_> = store
        .find_all("pets", &Record::new().with("kind", "cat"))
        .expect("find_all")
        .collect::<Result<_>>()
        .expect("adopt");
    assert_eq!(cats.len(), 2);

    let momo = store
        .find_one("pets", &Record::new().with("kind", "cat").with("name", "momo"))
        .expect("find")
        .expect("row");
    assert_eq!(momo.read().unwrap().id(), Some(1));
}

#[test]
fn a_null_predicate_matches_rows_without_the_value() {
    let store = Store::in_memory();
    store
        .insert("pets", Record::new().with("name", "momo").with("chip", "A1"))
        .expect("insert");
    store
        .insert("pets", Record::new().with("name", "rex").with("chip", Value::Null))
        .expect("insert");

    let unchipped = store
        .find_one("pets", &Record::new().with("chip", Value::Null))
        .expect("find")
        .expect("NULL compares with IS NULL");
    assert_eq!(unchipped.read().unwrap().id(), Some(2));
}

#[test]
fn a_missing_table_reads_as_no_match() {
    let store = Store::in_memory();
    assert!(store.find_one("ghosts", &Record::new()).expect("find").is_none());

    let rows: Vec<_> = store
        .find_all("ghosts", &Record::new())
        .expect("find_all")
        .collect::<Result<_>>()
        .expect("adopt");
    assert!(rows.is_empty());
    assert_eq!(store.debug_info().live_records, 0);
}

#[test]
fn the_result_iterator_adopts_lazily_and_is_one_shot() {
    let store = Store::in_memory();
    seed(&store);
    let seeded: Vec<_> = store
        .find_all("users", &Record::new())
        .expect("find_all")
        .collect::<Result<_>>()
        .expect("adopt");
    for handle in &seeded {
        store.commit("users", handle).expect("commit");
    }
    assert_eq!(store.debug_info().live_records, 0);

    let mut iter = store.find_all("users", &Record::new()).expect("find_all");
    assert_eq!(iter.remaining(), 4);

    let first = iter.next().expect("first item").expect("adopt");
    assert_eq!(first.read().unwrap().id(), Some(1));
    assert_eq!(
        store.debug_info().live_records,
        1,
        "rows are adopted as they are produced"
    );

    drop(iter);
    assert_eq!(
        store.debug_info().live_records,
        1,
        "rows never produced were never adopted"
    );
}
