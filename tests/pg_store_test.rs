//! Runs the Postgres stores against a real database.
//!
//! Set `TEST_DATABASE_URL` to a throwaway database to enable these tests. The
//! tables are truncated before every test, so never point it at real data.

mod common;

use std::env;
use std::sync::{Arc, Mutex, MutexGuard};

use attendance_backend::{
    config::DEFAULT_QR_UPSTREAM_URL,
    database::{
        pool::{create_pool, run_migrations},
        PgQrCodeStore, PgSessionStore, PgUserStore, QrCodeStore, SessionResolver, SessionStore,
        UserStore,
    },
    error::Error,
    models::{
        qrcode::{MarkOutcome, QrCodeCounts, ScanKind},
        user::{NewUser, UserChanges},
    },
    utils::token::{generate_access_token, TOKEN_LENGTH},
};
use chrono::{Duration, Utc};
use common::test_config;
use sqlx::PgPool;
use uuid::Uuid;

static DB_LOCK: Mutex<()> = Mutex::new(());

fn serialize() -> MutexGuard<'static, ()> {
    DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn test_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };
    let mut config = test_config(DEFAULT_QR_UPSTREAM_URL);
    config.database_url = url;

    let pool = create_pool(&config).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");
    sqlx::query("TRUNCATE qrcodes, sessions, users")
        .execute(&pool)
        .await
        .expect("truncate");
    Some(pool)
}

fn tokens(n: usize) -> Vec<String> {
    (0..n).map(|_| generate_access_token(TOKEN_LENGTH)).collect()
}

fn new_user(email: &str, role: Option<&str>) -> NewUser {
    NewUser {
        name: "Panitia".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$unused".to_string(),
        role: role.map(str::to_string),
    }
}

#[tokio::test]
async fn batch_insert_is_all_or_nothing() {
    let _db = serialize();
    let Some(pool) = test_pool().await else { return };
    let store = PgQrCodeStore::new(pool);

    let issued = tokens(3);
    let rows = store.insert_batch(&issued).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| !r.hadir && !r.souvenir));
    let mut stored: Vec<String> = rows.into_iter().map(|r| r.token).collect();
    stored.sort();
    let mut expected = issued.clone();
    expected.sort();
    assert_eq!(stored, expected);

    let clash = vec![generate_access_token(TOKEN_LENGTH), issued[0].clone()];
    assert!(matches!(
        store.insert_batch(&clash).await.unwrap_err(),
        Error::Conflict { .. }
    ));
    assert_eq!(store.count(None).await.unwrap(), 3);
    assert!(store.find_by_token(&clash[0]).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_check_ins_have_one_winner() {
    let _db = serialize();
    let Some(pool) = test_pool().await else { return };
    let store = Arc::new(PgQrCodeStore::new(pool));
    let token = store.insert_batch(&tokens(1)).await.unwrap()[0].token.clone();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            let token = token.clone();
            tokio::spawn(async move { store.mark(&token, ScanKind::Hadir).await })
        })
        .collect();

    let (mut marked, mut already) = (0, 0);
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            MarkOutcome::Marked(row) => {
                assert!(row.hadir);
                marked += 1;
            }
            MarkOutcome::AlreadyMarked(row) => {
                assert!(row.hadir);
                already += 1;
            }
            MarkOutcome::NotFound => panic!("token vanished"),
        }
    }
    assert_eq!((marked, already), (1, 15));

    assert_eq!(
        store.mark("no-such-token", ScanKind::Hadir).await.unwrap(),
        MarkOutcome::NotFound
    );
    match store.mark(&token, ScanKind::Souvenir).await.unwrap() {
        MarkOutcome::Marked(row) => assert!(row.hadir && row.souvenir),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn counts_filters_and_recent() {
    let _db = serialize();
    let Some(pool) = test_pool().await else { return };
    let store = PgQrCodeStore::new(pool);
    let issued = tokens(4);
    store.insert_batch(&issued).await.unwrap();

    store.mark(&issued[0], ScanKind::Hadir).await.unwrap();
    store.mark(&issued[1], ScanKind::Hadir).await.unwrap();
    store.mark(&issued[1], ScanKind::Souvenir).await.unwrap();

    assert_eq!(
        store.counts().await.unwrap(),
        QrCodeCounts {
            total: 4,
            hadir: 2,
            souvenir: 1,
        }
    );
    assert_eq!(store.count(Some(ScanKind::Hadir)).await.unwrap(), 2);
    assert_eq!(store.count(Some(ScanKind::Souvenir)).await.unwrap(), 1);

    let checked_in = store.list(Some(ScanKind::Hadir), 10, 0).await.unwrap();
    assert_eq!(checked_in.len(), 2);
    assert!(checked_in.iter().all(|r| r.hadir));

    let recent = store.recent(ScanKind::Hadir, 10).await.unwrap();
    let order: Vec<&str> = recent.iter().map(|r| r.token.as_str()).collect();
    assert_eq!(order, vec![issued[1].as_str(), issued[0].as_str()]);
    assert_eq!(store.recent(ScanKind::Hadir, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_orders_newest_first_with_offsets() {
    let _db = serialize();
    let Some(pool) = test_pool().await else { return };
    let store = PgQrCodeStore::new(pool);
    store.insert_batch(&tokens(3)).await.unwrap();
    let later = tokens(2);
    store.insert_batch(&later).await.unwrap();

    let all = store.list(None, 10, 0).await.unwrap();
    assert_eq!(all.len(), 5);
    for pair in all.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.created_at > b.created_at || (a.created_at == b.created_at && a.id > b.id));
    }
    assert!(all[..2].iter().all(|r| later.contains(&r.token)));

    let window = store.list(None, 2, 2).await.unwrap();
    assert_eq!(window, all[2..4].to_vec());
    assert!(store.list(None, 10, 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn user_store_conflicts_and_partial_updates() {
    let _db = serialize();
    let Some(pool) = test_pool().await else { return };
    let users = PgUserStore::new(pool);

    let first = users.create(new_user("ketua@example.com", Some("admin"))).await.unwrap();
    match users.create(new_user("ketua@example.com", None)).await.unwrap_err() {
        Error::Conflict { message, .. } => assert_eq!(message, "Email already registered"),
        other => panic!("unexpected {other:?}"),
    }

    let second = users.create(new_user("wakil@example.com", None)).await.unwrap();
    let steal = UserChanges {
        email: Some("ketua@example.com".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        users.update(second.id, steal).await.unwrap_err(),
        Error::Conflict { .. }
    ));

    let rename = UserChanges {
        name: Some("Wakil Ketua".to_string()),
        ..Default::default()
    };
    let renamed = users.update(second.id, rename.clone()).await.unwrap().unwrap();
    assert_eq!(renamed.name, "Wakil Ketua");
    assert_eq!(renamed.email, "wakil@example.com");
    assert!(users.update(Uuid::new_v4(), rename).await.unwrap().is_none());

    assert_eq!(users.count().await.unwrap(), 2);
    let page = users.list(1, 0).await.unwrap();
    assert_eq!(page[0].id, second.id);

    assert!(users.delete(first.id).await.unwrap());
    assert!(!users.delete(first.id).await.unwrap());
    assert!(users.find_by_email("ketua@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn sessions_expire_purge_and_cascade() {
    let _db = serialize();
    let Some(pool) = test_pool().await else { return };
    let users = PgUserStore::new(pool.clone());
    let sessions = PgSessionStore::new(pool.clone());
    let user = users.create(new_user("ketua@example.com", Some("admin"))).await.unwrap();
    let now = Utc::now();

    sessions.create("live", user.id, now + Duration::hours(1)).await.unwrap();
    sessions.create("stale", user.id, now - Duration::seconds(1)).await.unwrap();
    assert!(sessions.resolve("stale").await.unwrap().is_none());

    let resolved = sessions.resolve("live").await.unwrap().unwrap();
    assert_eq!(resolved.user_id, user.id);
    assert_eq!(resolved.roles(), vec!["admin"]);

    sessions.create("next", user.id, now + Duration::hours(1)).await.unwrap();
    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 2);

    sessions.delete("live").await.unwrap();
    assert!(sessions.resolve("live").await.unwrap().is_none());

    assert!(users.delete(user.id).await.unwrap());
    assert!(sessions.resolve("next").await.unwrap().is_none());
}
