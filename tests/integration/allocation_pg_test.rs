//! Allocation against a real PostgreSQL database.
//!
//! Runs only when `KEYDROP_TEST_DATABASE_URL` points at a disposable
//! database; every test truncates the Keydrop tables.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::Mutex;

use keydrop_core::config::{AllocationConfig, ViewsConfig};
use keydrop_core::types::id::{ChannelId, CommunityId, UserId};
use keydrop_database::repositories::{RecordRepository, ViewPointerRepository};
use keydrop_database::store::{RecordStore, ViewPointerStore};
use keydrop_entity::community::CommunitySettings;
use keydrop_entity::record::RecordKind;
use keydrop_entity::record::model::NewRecord;
use keydrop_entity::view::ViewKind;
use keydrop_service::testing::{
    RecordingDelivery, RecordingNotifier, RecordingPublisher, StaticDirectory,
};
use keydrop_service::{
    AllocationEngine, AllocationError, ClaimRequest, InventoryAggregator, LeaderboardAggregator,
    ViewStore,
};

static DATABASE: Mutex<()> = Mutex::const_new(());

struct Harness {
    pool: PgPool,
    records: RecordRepository,
    delivery: Arc<RecordingDelivery>,
    engine: AllocationEngine,
    views: Arc<ViewStore>,
}

async fn harness() -> Option<Harness> {
    let Ok(url) = std::env::var("KEYDROP_TEST_DATABASE_URL") else {
        eprintln!("KEYDROP_TEST_DATABASE_URL not set; skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&url)
        .await
        .expect("connect to test database");
    keydrop_database::migration::run_migrations(&pool)
        .await
        .expect("run migrations");
    sqlx::query("TRUNCATE records, view_pointers, community_settings RESTART IDENTITY")
        .execute(&pool)
        .await
        .expect("truncate");

    let records = RecordRepository::new(pool.clone());
    let store: Arc<dyn RecordStore> = Arc::new(records.clone());
    let delivery = Arc::new(RecordingDelivery::new());
    let views = Arc::new(ViewStore::new(
        Arc::new(ViewPointerRepository::new(pool.clone())),
        Arc::new(RecordingPublisher::new()),
        InventoryAggregator::new(Arc::clone(&store)),
        LeaderboardAggregator::new(Arc::clone(&store), Arc::new(StaticDirectory::new()), 10),
        ViewsConfig::default(),
    ));
    let engine = AllocationEngine::new(
        store,
        delivery.clone(),
        Arc::new(RecordingNotifier::new()),
        Arc::clone(&views),
        AllocationConfig::default(),
    );

    Some(Harness {
        pool,
        records,
        delivery,
        engine,
        views,
    })
}

fn steam(n: usize) -> Vec<NewRecord> {
    (0..n)
        .map(|i| NewRecord::login(RecordKind::Steam, format!("user{i:03}"), "pw"))
        .collect()
}

async fn used_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE is_used = TRUE")
        .fetch_one(pool)
        .await
        .expect("count used")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_never_share_a_record() {
    let _guard = DATABASE.lock().await;
    let Some(h) = harness().await else { return };
    h.records.seed(&steam(10)).await.unwrap();

    let settings = CommunitySettings::unconfigured(CommunityId::new(1));
    let claims = (1..=5u64).map(|requester| {
        let request = ClaimRequest::new("steam", Some(3), UserId::new(requester)).unwrap();
        let engine = &h.engine;
        let settings = &settings;
        async move { engine.allocate(settings, &request).await }
    });
    let results = join_all(claims).await;

    let mut seen = HashSet::new();
    let mut granted = 0;
    for result in results {
        match result {
            Ok(allocation) => {
                for record in &allocation.records {
                    assert!(seen.insert(record.id), "record {} handed out twice", record.id);
                }
                granted += allocation.count();
            }
            Err(AllocationError::EmptyInventory { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert!(granted <= 10);
    assert_eq!(used_count(&h.pool).await, granted as i64);
}

#[tokio::test]
async fn delivery_failure_leaves_records_free() {
    let _guard = DATABASE.lock().await;
    let Some(h) = harness().await else { return };
    h.records.seed(&steam(3)).await.unwrap();
    h.delivery.set_failing(true);

    let settings = CommunitySettings::unconfigured(CommunityId::new(1));
    let request = ClaimRequest::new("steam", Some(2), UserId::new(7)).unwrap();
    let err = h.engine.allocate(&settings, &request).await.unwrap_err();

    assert!(matches!(err, AllocationError::DeliveryFailure { .. }));
    assert_eq!(used_count(&h.pool).await, 0);
    let claimed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE claimed_by = $1")
        .bind(7_i64)
        .fetch_one(&h.pool)
        .await
        .expect("count claimed");
    assert_eq!(claimed, 0);
}

#[tokio::test]
async fn steam_pool_drains_in_id_order() {
    let _guard = DATABASE.lock().await;
    let Some(h) = harness().await else { return };
    let ids = h.records.seed(&steam(3)).await.unwrap();
    let settings = CommunitySettings::unconfigured(CommunityId::new(1));

    let first = h
        .engine
        .allocate(&settings, &ClaimRequest::new("steam", Some(2), UserId::new(1)).unwrap())
        .await
        .unwrap();
    let second = h
        .engine
        .allocate(&settings, &ClaimRequest::new("steam", Some(2), UserId::new(2)).unwrap())
        .await
        .unwrap();
    let third = h
        .engine
        .allocate(&settings, &ClaimRequest::new("steam", Some(1), UserId::new(3)).unwrap())
        .await;

    let first_ids: Vec<i64> = first.records.iter().map(|r| r.id).collect();
    assert_eq!(first_ids, ids[..2].to_vec());
    assert_eq!(second.records.len(), 1);
    assert_eq!(second.records[0].id, ids[2]);
    assert!(matches!(third, Err(AllocationError::EmptyInventory { .. })));

    let snapshot = h.views.inventory().snapshot().await.unwrap();
    assert_eq!(snapshot.total, 0);
}

#[tokio::test]
async fn view_pointer_upsert_overwrites() {
    let _guard = DATABASE.lock().await;
    let Some(h) = harness().await else { return };
    let pointers = ViewPointerRepository::new(h.pool.clone());
    let community = CommunityId::new(9);

    h.views
        .publish(community, ViewKind::Inventory, ChannelId::new(10), None)
        .await
        .unwrap();
    let second = h
        .views
        .publish(community, ViewKind::Inventory, ChannelId::new(11), None)
        .await
        .unwrap();

    let stored = pointers
        .find(community, ViewKind::Inventory)
        .await
        .unwrap()
        .expect("pointer stored");
    assert_eq!(stored.channel_id, ChannelId::new(11));
    assert_eq!(stored.message_id, second.message_id);
    assert_eq!(pointers.communities().await.unwrap(), vec![community]);
}
