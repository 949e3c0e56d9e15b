use librarian_core::{
    DeletionPolicy, File, SavedSearch, ServerSettings, StandingOrder, Store, StoreKind,
    TransferStatus,
};
use librarian_db::Database;
use librarian_store::LocalStore;
use librarian_tasks::{check_on_consumed_item, consume_queue_item, TransferManagerState};
use librarian_transfer::LocalCopyTransferManager;
use sqlx::PgPool;

async fn seed_librarian(db: &Database, name: &str) {
    sqlx::query("INSERT INTO librarians (name, url, port, available) VALUES ($1, $2, $3, TRUE)")
        .bind(name)
        .bind(format!("http://{name}.example"))
        .bind(8080_i32)
        .execute(db.pool())
        .await
        .unwrap();
}

async fn seed_file(db: &Database, name: &str) {
    db.create_file(&File::new(
        name.to_string(),
        100,
        "d41d8cd98f00b204e9800998ecf8427e".to_string(),
        "tester".to_string(),
        "origin".to_string(),
    ))
    .await
    .unwrap();
}

/// Scenario 1 — happy-path outgoing: a consumer tick marks the queue item
/// consumed, then a checker tick flips the child transfer to STAGED and
/// the queue item completed.
#[sqlx::test]
async fn happy_path_outgoing_transfer(pool: PgPool) {
    let db = Database::from_pool(pool).await.unwrap();
    seed_librarian(&db, "peer-a").await;
    seed_file(&db, "data.bin").await;

    let outgoing = db
        .create_outgoing_transfer(
            "data.bin",
            "peer-a",
            "/src/data.bin",
            "/dst/data.bin",
            100,
            "d41d8cd98f00b204e9800998ecf8427e",
            None,
        )
        .await
        .unwrap();

    let manager = TransferManagerState::Local(LocalCopyTransferManager::new());
    let staging = tempfile::tempdir().unwrap();
    let source = staging.path().join("data.bin");
    tokio::fs::write(&source, vec![0u8; 100]).await.unwrap();
    let dest = staging.path().join("out/data.bin");

    db.enqueue_send_queue_item(
        5,
        "peer-a",
        manager.to_json(),
        &[(outgoing.id, source.display().to_string(), dest.display().to_string())],
    )
    .await
    .unwrap();

    let mut settings = ServerSettings::default();
    settings.complete_status = TransferStatus::Staged;

    let worked = consume_queue_item(&db, &settings).await.unwrap();
    assert!(worked);

    let item = sqlx::query_as::<_, (bool,)>("SELECT consumed FROM send_queue")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert!(item.0);

    let worked = check_on_consumed_item(&db, &settings).await.unwrap();
    assert!(worked);

    let refreshed = db.get_outgoing_transfer(outgoing.id).await.unwrap().unwrap();
    assert_eq!(refreshed.status, TransferStatus::Staged);

    let row = sqlx::query_as::<_, (bool,)>("SELECT completed FROM send_queue")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert!(row.0);
}

/// Scenario 2 — retry exhaustion: a manager whose batch_transfer always
/// fails (source path does not exist) drives the item to `failed=true`
/// once retries exceed `max_async_send_retries`.
#[sqlx::test]
async fn retry_exhaustion_marks_item_and_children_failed(pool: PgPool) {
    let db = Database::from_pool(pool).await.unwrap();
    seed_librarian(&db, "peer-a").await;
    seed_file(&db, "data.bin").await;

    let outgoing = db
        .create_outgoing_transfer(
            "data.bin",
            "peer-a",
            "/does/not/exist.bin",
            "/dst/data.bin",
            100,
            "d41d8cd98f00b204e9800998ecf8427e",
            None,
        )
        .await
        .unwrap();

    let manager = TransferManagerState::Local(LocalCopyTransferManager::new());
    db.enqueue_send_queue_item(
        0,
        "peer-a",
        manager.to_json(),
        &[(outgoing.id, "/does/not/exist.bin".to_string(), "/dst/data.bin".to_string())],
    )
    .await
    .unwrap();

    let mut settings = ServerSettings::default();
    settings.max_async_send_retries = 2;

    for _ in 0..3 {
        assert!(consume_queue_item(&db, &settings).await.unwrap());
    }

    let row = sqlx::query_as::<_, (i32, bool, bool)>(
        "SELECT retries, failed, consumed FROM send_queue",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(row.0, 3);
    assert!(row.1);
    assert!(!row.2);
}

/// Scenario 3 — incoming mismatch: the staged file's observed size
/// doesn't match the advertised transfer size, so the reconciler leaves
/// the transfer ONGOING without creating a File or Instance.
#[sqlx::test]
async fn incoming_mismatch_leaves_transfer_ongoing(pool: PgPool) {
    let db = Database::from_pool(pool).await.unwrap();

    let staging = tempfile::tempdir().unwrap();
    let staged_path = staging.path().join("upload.bin");
    tokio::fs::write(&staged_path, vec![0u8; 100]).await.unwrap();

    db.create_store(&Store {
        name: "store-a".to_string(),
        kind: StoreKind::Local,
        root: staging.path().to_path_buf(),
        ingestable: true,
        available: true,
        enabled: true,
    })
    .await
    .unwrap();

    let transfer = db
        .create_incoming_transfer(
            "upload.bin",
            "tester",
            "origin-librarian",
            101,
            "d41d8cd98f00b204e9800998ecf8427e",
            staged_path.to_str().unwrap(),
            staging.path().join("final/upload.bin").to_str().unwrap(),
            "store-a",
        )
        .await
        .unwrap();

    let store = LocalStore::new(staging.path());
    let http = reqwest::Client::new();
    let settings = ServerSettings::default();

    librarian_tasks::reconcile_incoming_transfers(&db, &store, &http, &settings)
        .await
        .unwrap();

    let refreshed = db.list_ongoing_incoming_transfers().await.unwrap();
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].id, transfer.id);
    assert!(db.get_file_by_name("upload.bin").await.unwrap().is_none());
}

/// Scenario 4 — incoming happy path: a matching staged file is committed,
/// recorded as a File + Instance, and the transfer flips to COMPLETED.
#[sqlx::test]
async fn incoming_happy_path_commits_and_completes(pool: PgPool) {
    let db = Database::from_pool(pool).await.unwrap();
    seed_librarian(&db, "origin-librarian").await;

    let staging = tempfile::tempdir().unwrap();
    let staged_path = staging.path().join("upload.bin");
    let payload = b"hello librarian";
    tokio::fs::write(&staged_path, payload).await.unwrap();

    db.create_store(&Store {
        name: "store-a".to_string(),
        kind: StoreKind::Local,
        root: staging.path().to_path_buf(),
        ingestable: true,
        available: true,
        enabled: true,
    })
    .await
    .unwrap();

    let final_path = staging.path().join("final/upload.bin");
    db.create_incoming_transfer(
        "upload.bin",
        "tester",
        "origin-librarian",
        payload.len() as i64,
        "8b61d638da9a35f66f93b51472e92698",
        staged_path.to_str().unwrap(),
        final_path.to_str().unwrap(),
        "store-a",
    )
    .await
    .unwrap();

    let store = LocalStore::new(staging.path());
    let http = reqwest::Client::new();
    let settings = ServerSettings::default();

    librarian_tasks::reconcile_incoming_transfers(&db, &store, &http, &settings)
        .await
        .unwrap();

    assert!(db.list_ongoing_incoming_transfers().await.unwrap().is_empty());
    assert!(db.get_file_by_name("upload.bin").await.unwrap().is_some());
    let instances = db.list_instances_for_store("store-a").await.unwrap();
    assert_eq!(instances.len(), 1);
    assert!(final_path.exists());
    assert!(!staged_path.exists());
}

/// Scenario 5 — standing order: of three matching files, one already has
/// an unresolved (non-failed) outgoing transfer under this order and is
/// skipped, and one has no available local instance and is skipped;
/// exactly one copy is launched.
#[sqlx::test]
async fn standing_order_launches_exactly_one_copy(pool: PgPool) {
    let db = Database::from_pool(pool).await.unwrap();
    seed_librarian(&db, "peer-a").await;

    db.create_store(&Store {
        name: "store-a".to_string(),
        kind: StoreKind::Local,
        root: "/data".into(),
        ingestable: true,
        available: true,
        enabled: true,
    })
    .await
    .unwrap();

    for name in ["zen1HH.uvc", "zen2HH.uvc", "zen3HH.uvc"] {
        seed_file(&db, name).await;
    }

    db.create_instance("zen1HH.uvc", "store-a", "/data/zen1HH.uvc", DeletionPolicy::Disallowed)
        .await
        .unwrap();
    db.create_instance("zen2HH.uvc", "store-a", "/data/zen2HH.uvc", DeletionPolicy::Disallowed)
        .await
        .unwrap();
    // zen3 has no instance: represents a file whose only copy is an
    // in-flight upload with nothing locally available to copy from yet.

    let order = StandingOrder {
        name: "nightly".to_string(),
        search: SavedSearch::NamedQuery {
            name: "special-test-2".to_string(),
        },
        conn_name: "peer-a".to_string(),
    };
    db.create_standing_order(&order).await.unwrap();
    db.create_outgoing_transfer(
        "zen2HH.uvc",
        "peer-a",
        "/data/zen2HH.uvc",
        "/data/zen2HH.uvc",
        100,
        "d41d8cd98f00b204e9800998ecf8427e",
        Some(&order.event_type()),
    )
    .await
    .unwrap();

    let mut evaluator = librarian_tasks::StandingOrderEvaluator::new();
    let settings = ServerSettings::default();
    let launched = evaluator
        .maybe_launch_copies(&db, &settings, std::time::Instant::now())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(launched, 1);
}

/// Scenario 6 — recommend store: picks the larger of two stores that
/// fits, and errors when neither does.
#[test]
fn recommend_store_picks_largest_fitting_and_errors_otherwise() {
    let candidates = vec![("small".to_string(), 50u64), ("large".to_string(), 200u64)];

    assert_eq!(
        librarian_core::recommend_store(&candidates, 150).unwrap(),
        "large"
    );

    assert!(librarian_core::recommend_store(&candidates, 250).is_err());
}
