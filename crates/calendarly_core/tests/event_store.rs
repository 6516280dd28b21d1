use calendarly_core::config::EVENTS_STORAGE_KEY;
use calendarly_core::db::{open_db, open_db_in_memory};
use calendarly_core::{
    validate_event, Category, Event, EventCandidate, EventId, EventStore, KvBackend, KvEventStore,
    MemoryKv, SchedulingRules, SqliteKv, StoreError,
};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn event(id: &str, title: &str, on: NaiveDate, start: &str, end: &str) -> Event {
    let candidate = EventCandidate::from_clock(id, title, on, start, end)
        .unwrap()
        .with_category(Category::Personal);
    validate_event(&candidate, &[], &SchedulingRules::default()).unwrap()
}

#[test]
fn empty_backend_lists_nothing() {
    let store = KvEventStore::new(MemoryKv::new());
    assert!(store.list().unwrap().is_empty());

    let blank = KvEventStore::new(MemoryKv::new().with_value(EVENTS_STORAGE_KEY, "  "));
    assert!(blank.list().unwrap().is_empty());
}

#[test]
fn reads_are_sorted_and_scoped_by_day_and_month() {
    let store = KvEventStore::new(MemoryKv::new());
    store
        .insert(&event("3", "Dentist", date(2024, 3, 4), "15:00", "16:00"))
        .unwrap();
    store
        .insert(&event("1", "Gym", date(2024, 3, 4), "07:00", "08:00"))
        .unwrap();
    store
        .insert(&event("2", "Rent", date(2024, 4, 1), "09:00", "09:30"))
        .unwrap();

    let all = store.list().unwrap();
    let ids = all.iter().map(|e| e.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["1", "3", "2"]);

    let march = store.list_for_month(2024, 3).unwrap();
    assert_eq!(march.len(), 2);
    assert_eq!(march[0].title, "Gym");

    let monday = store.list_for_day(date(2024, 3, 4)).unwrap();
    assert_eq!(monday.len(), 2);
    assert!(store.list_for_day(date(2024, 3, 5)).unwrap().is_empty());
}

#[test]
fn insert_rejects_duplicate_ids() {
    let store = KvEventStore::new(MemoryKv::new());
    let gym = event("1", "Gym", date(2024, 3, 4), "07:00", "08:00");
    store.insert(&gym).unwrap();

    let err = store.insert(&gym).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId(id) if id == gym.id));
}

#[test]
fn replace_requires_existing_id() {
    let store = KvEventStore::new(MemoryKv::new());
    let gym = event("1", "Gym", date(2024, 3, 4), "07:00", "08:00");

    let err = store.replace(&gym.id, &gym).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == gym.id));

    store.insert(&gym).unwrap();
    let moved = event("1", "Gym", date(2024, 3, 5), "07:00", "08:00");
    store.replace(&gym.id, &moved).unwrap();
    assert_eq!(store.get(&gym.id).unwrap(), Some(moved));
}

#[test]
fn remove_is_idempotent() {
    let backend = MemoryKv::new();
    let store = KvEventStore::new(&backend);
    store
        .insert(&event("1", "Gym", date(2024, 3, 4), "07:00", "08:00"))
        .unwrap();
    store
        .insert(&event("2", "Rent", date(2024, 3, 4), "09:00", "09:30"))
        .unwrap();

    store.remove(&EventId::from("1")).unwrap();
    let once = backend.read(EVENTS_STORAGE_KEY).unwrap();
    store.remove(&EventId::from("1")).unwrap();
    let twice = backend.read(EVENTS_STORAGE_KEY).unwrap();

    assert_eq!(once, twice);
    assert_eq!(store.list().unwrap().len(), 1);
    store.remove(&EventId::from("never-stored")).unwrap();
}

#[test]
fn blob_uses_flat_camel_case_records() {
    let backend = MemoryKv::new();
    let store = KvEventStore::new(&backend);
    let mut standup = event("1700000000000", "Standup", date(2024, 3, 4), "09:00", "10:00");
    standup.description = Some("daily".to_string());
    store.insert(&standup).unwrap();

    let blob = backend.read(EVENTS_STORAGE_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&blob).unwrap();
    assert_eq!(json[0]["id"], "1700000000000");
    assert_eq!(json[0]["startTime"], "2024-03-04T09:00:00");
    assert_eq!(json[0]["endTime"], "2024-03-04T10:00:00");
    assert_eq!(json[0]["description"], "daily");
    assert_eq!(json[0]["category"], "personal");
}

#[test]
fn unknown_category_fails_at_read_boundary() {
    let blob = r#"[{"id":"1","title":"Mystery","startTime":"2024-03-04T09:00:00",
        "endTime":"2024-03-04T10:00:00","category":"party"}]"#;
    let store = KvEventStore::new(MemoryKv::new().with_value(EVENTS_STORAGE_KEY, blob));

    let err = store.list().unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(message) if message.contains("party")));
}

#[test]
fn corrupt_blob_is_invalid_data() {
    let store = KvEventStore::new(MemoryKv::new().with_value(EVENTS_STORAGE_KEY, "{not json"));
    assert!(matches!(store.list(), Err(StoreError::InvalidData(_))));
}

#[test]
fn sqlite_backend_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calendar.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let store = KvEventStore::new(SqliteKv::new(&conn));
        store
            .insert(&event("1", "Gym", date(2024, 3, 4), "07:00", "08:00"))
            .unwrap();
        store
            .insert(&event("2", "Rent", date(2024, 3, 4), "09:00", "09:30"))
            .unwrap();
        store.remove(&EventId::from("2")).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = KvEventStore::new(SqliteKv::new(&conn));
    let events = store.list().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Gym");
}

#[test]
fn sqlite_backend_overwrites_value_for_same_key() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKv::new(&conn);

    assert_eq!(kv.read("k").unwrap(), None);
    kv.write("k", "one").unwrap();
    kv.write("k", "two").unwrap();
    assert_eq!(kv.read("k").unwrap().as_deref(), Some("two"));

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM kv_store;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}
