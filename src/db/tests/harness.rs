//! Database setup for store tests.
//!
//! Both backends are migrated with the real files under `migrations_sqlx/`.

#[cfg(feature = "database-sqlite")]
use sqlx::SqlitePool;

/// Private in-memory SQLite database on a single connection.
///
/// An in-memory database lives as long as its connection, so the pool must
/// never open a second one.
#[cfg(feature = "database-sqlite")]
pub async fn create_sqlite_pool() -> SqlitePool {
    let options = sqlx::sqlite::SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite database")
}

#[cfg(feature = "database-sqlite")]
pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations_sqlx/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

/// PostgreSQL in a container shared by every test of the run.
#[cfg(all(test, feature = "database-postgres"))]
pub mod postgres {
    use sqlx::{PgPool, postgres::PgPoolOptions};
    use testcontainers_modules::{
        postgres::Postgres,
        testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner},
    };
    use tokio::sync::OnceCell;

    struct Server {
        // Dropping the handle stops the container
        _container: ContainerAsync<Postgres>,
        url: String,
    }

    static SERVER: OnceCell<Server> = OnceCell::const_new();

    async fn server() -> &'static Server {
        SERVER
            .get_or_init(|| async {
                let container = Postgres::default()
                    .with_tag("18-alpine")
                    .start()
                    .await
                    .expect("Failed to start PostgreSQL container");
                let host = container.get_host().await.expect("Failed to get host");
                let port = container
                    .get_host_port_ipv4(5432)
                    .await
                    .expect("Failed to get port");

                Server {
                    _container: container,
                    url: format!("postgres://postgres:postgres@{host}:{port}/postgres"),
                }
            })
            .await
    }

    /// Pool whose `search_path` points at a fresh schema, so each test sees
    /// empty `prompts` and `tags` tables.
    pub async fn create_isolated_postgres_pool() -> PgPool {
        let server = server().await;
        let schema = format!("pv_{}", uuid::Uuid::new_v4().simple());

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&server.url)
            .await
            .expect("Failed to connect to PostgreSQL");
        sqlx::query(&format!("CREATE SCHEMA \"{schema}\""))
            .execute(&admin)
            .await
            .expect("Failed to create test schema");
        admin.close().await;

        PgPoolOptions::new()
            .max_connections(5)
            .connect(&format!("{}?options=-c search_path={schema}", server.url))
            .await
            .expect("Failed to connect to test schema")
    }

    pub async fn run_postgres_migrations(pool: &PgPool) {
        sqlx::migrate!("./migrations_sqlx/postgres")
            .run(pool)
            .await
            .expect("Failed to run PostgreSQL migrations");
    }
}
