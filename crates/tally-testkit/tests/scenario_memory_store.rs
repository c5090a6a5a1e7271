use tally_db::{students, RegisterOutcome, ScoreStore};
use tally_testkit::{reference_snapshot, MemoryStore};

#[tokio::test]
async fn fetches_return_what_was_set() {
    let store = MemoryStore::with_snapshot(reference_snapshot());
    assert_eq!(store.fetch_teams().await.unwrap().len(), 3);
    assert_eq!(store.fetch_events().await.unwrap().len(), 1);
    assert_eq!(store.fetch_score_log().await.unwrap().len(), 3);
    assert_eq!(
        store.fetch_display_settings().await.unwrap().public_redirect,
        None
    );
}

#[tokio::test]
async fn unreachable_store_fails_every_fetch() {
    let store = MemoryStore::with_snapshot(reference_snapshot());
    store.set_unreachable(true);
    assert!(store.fetch_teams().await.is_err());
    assert!(store.fetch_score_log().await.is_err());
    store.set_unreachable(false);
    assert!(store.fetch_teams().await.is_ok());
}

#[tokio::test]
async fn notify_reaches_open_feeds_and_drops_closed_ones() {
    let store = MemoryStore::new();
    let mut feed = store.subscribe().await.unwrap();
    let dropped = store.subscribe().await.unwrap();
    drop(dropped);

    assert_eq!(store.notify("teams"), 1);
    let n = feed.next_change().await.expect("notice");
    assert_eq!(n.table, "teams");
}

#[tokio::test]
async fn duplicate_registration_is_refused() {
    let store = MemoryStore::new();
    let a = students::new_student("s1", "Ada", None, "pw");
    let b = students::new_student("s1", "Bob", None, "pw");
    assert!(matches!(
        store.register_student(&a).await.unwrap(),
        RegisterOutcome::Registered(_)
    ));
    assert_eq!(
        store.register_student(&b).await.unwrap(),
        RegisterOutcome::Duplicate
    );
    assert_eq!(store.student_count(), 1);
}

#[test]
fn snapshot_json_fixture_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snap.json");
    std::fs::write(
        &path,
        serde_json::to_string(&reference_snapshot()).unwrap(),
    )
    .unwrap();
    let snap = tally_testkit::load_snapshot_json(path.to_str().unwrap()).unwrap();
    assert_eq!(snap, reference_snapshot());
}
