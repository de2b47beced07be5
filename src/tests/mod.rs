//! Shared fixtures and end-to-end HTTP tests.
//!
//! End-to-end tests drive the full axum `Router` (middleware included) with
//! `tower::ServiceExt::oneshot` against a private in-memory SQLite database.


/// Build application state backed by a fresh, migrated in-memory SQLite database.
#[cfg(feature = "database-sqlite")]
pub async fn test_state() -> crate::AppState {
    use std::sync::atomic::{AtomicU64, Ordering};

    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let db_id = COUNTER.fetch_add(1, Ordering::SeqCst);

    let config_str = format!(
        r#"
[database]
type = "sqlite"
path = "file:promptvault_test_{}?mode=memory&cache=shared"
create_if_missing = true
run_migrations = true
wal_mode = false
max_connections = 1
"#,
        db_id
    );

    let config = crate::config::Config::from_str(&config_str).expect("Failed to parse test config");
    crate::AppState::new(config)
        .await
        .expect("Failed to create AppState")
}
