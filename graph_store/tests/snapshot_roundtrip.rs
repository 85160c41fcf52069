use graph_store::{Direction, GraphStore, Properties, PropertyValue, StoreConfig, StoreError};

fn sample_store(config: StoreConfig) -> GraphStore {
    let mut store = GraphStore::with_config(config);
    let mut props = Properties::new();
    props.insert("email".to_string(), PropertyValue::from("john@example.com"));

    store.add_entity("John", "Person", Some(props), Some("Software engineer"));
    store.add_entity("Acme", "Organization", None, Some("Widget maker"));
    store.add_entity("Paris", "Location", None, None);
    store.add_relationship("John", "Acme", "works_at", None, 1.0);
    store.add_relationship("Acme", "Paris", "located_in", None, 0.5);
    store
}

#[test]
fn test_save_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::in_dir(dir.path().join("nested"));

    let store = sample_store(config.clone());
    store.save().unwrap();
    assert!(config.snapshot_path.exists());

    let reopened = GraphStore::open(config).unwrap();
    assert_eq!(reopened.statistics(), store.statistics());

    let john = reopened.get_entity("John").unwrap();
    assert_eq!(john.description, "Software engineer");
    assert_eq!(john.properties["email"], PropertyValue::from("john@example.com"));

    let reached = reopened.find_connected("John", 2, None, Direction::Outgoing);
    assert_eq!(reached, vec!["Acme", "Paris"]);
}

#[test]
fn test_reopen_preserves_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::in_dir(dir.path());

    let mut store = sample_store(config.clone());
    let mut extra = Properties::new();
    extra.insert("level".to_string(), PropertyValue::from(3));
    store.add_entity("John", "Person", Some(extra), None);

    let mut since = Properties::new();
    since.insert("since".to_string(), PropertyValue::from(2019));
    store.add_relationship("John", "Paris", "lives_in", Some(since), 0.25);
    store.save().unwrap();

    let john = store.get_entity("John").unwrap();
    assert!(john.updated_at.is_some());

    let reopened = GraphStore::open(config).unwrap();
    let before: Vec<_> = store.entities().collect();
    let after: Vec<_> = reopened.entities().collect();
    assert_eq!(after, before);
    assert_eq!(reopened.get_entity("John"), Some(john));

    let before: Vec<_> = store.relationships().collect();
    let after: Vec<_> = reopened.relationships().collect();
    assert_eq!(after, before);

    let lives_in = reopened
        .relationships()
        .find(|r| r.relation_type == "lives_in")
        .unwrap();
    assert_eq!(lives_in.weight, 0.25);
    assert_eq!(lives_in.properties["since"], PropertyValue::from(2019));
}

#[test]
fn test_open_missing_snapshot_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = GraphStore::open(StoreConfig::in_dir(dir.path())).unwrap();
    assert_eq!(store.entity_count(), 0);
}

#[test]
fn test_compact_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        pretty_snapshots: false,
        ..StoreConfig::in_dir(dir.path())
    };

    sample_store(config.clone()).save().unwrap();
    let text = std::fs::read_to_string(&config.snapshot_path).unwrap();
    assert!(!text.contains('\n'));
}

#[test]
fn test_load_corrupt_snapshot_keeps_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut store = sample_store(StoreConfig::in_dir(dir.path()));
    let result = store.load_from(&path);

    assert!(matches!(result, Err(StoreError::Snapshot(_))));
    assert_eq!(store.entity_count(), 3);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = GraphStore::new();
    let result = store.load_from(dir.path().join("absent.json"));
    assert!(matches!(result, Err(StoreError::Io { .. })));
}
