//! PostgreSQL test databases
//!
//! One container is started per test binary. Every `TestDatabase` is a fresh
//! database created inside it with the invoice schema applied, so tests never
//! see each other's rows. Connections are opened per test, which keeps each
//! pool on the runtime of the `#[tokio::test]` that uses it.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;
use uuid::Uuid;

const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const ADMIN_DATABASE: &str = "postgres";

const SCHEMA: &str = include_str!("../../../migrations/20240101_000001_invoice_schema.sql");

/// Invoice tables, children first
pub const INVOICE_TABLES: [&str; 3] = ["invoice_payments", "invoice_items", "invoices"];

pub type TestDbResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

struct PostgresServer {
    _container: ContainerAsync<GenericImage>,
    host: String,
    port: u16,
}

impl PostgresServer {
    async fn start() -> TestDbResult<Self> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .start()
            .await?;

        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(5432).await?;

        Ok(Self {
            _container: container,
            host,
            port,
        })
    }

    fn options(&self, database: &str) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(POSTGRES_USER)
            .password(POSTGRES_PASSWORD)
            .database(database)
    }
}

static SERVER: OnceCell<PostgresServer> = OnceCell::const_new();

async fn server() -> TestDbResult<&'static PostgresServer> {
    SERVER.get_or_try_init(PostgresServer::start).await
}

/// A database of its own inside the shared test container
pub struct TestDatabase {
    name: String,
    pool: PgPool,
}

impl TestDatabase {
    /// Creates an empty database with the invoice schema applied
    ///
    /// # Errors
    ///
    /// Returns an error if Docker is unavailable or the schema fails to apply.
    pub async fn new() -> TestDbResult<Self> {
        let server = server().await?;
        let name = format!("invoicing_{}", Uuid::new_v4().simple());

        let mut admin = PgConnection::connect_with(&server.options(ADMIN_DATABASE)).await?;
        sqlx::query(&format!("CREATE DATABASE {}", name))
            .execute(&mut admin)
            .await?;
        admin.close().await?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(server.options(&name))
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(Self { name, pool })
    }

    /// Name of the database inside the container
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Removes every invoice row, keeping the schema
    pub async fn clear_data(&self) -> TestDbResult<()> {
        sqlx::query(&format!("TRUNCATE TABLE {}", INVOICE_TABLES.join(", ")))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Number of rows in one of the invoice tables
    pub async fn row_count(&self, table: &str) -> TestDbResult<i64> {
        if !INVOICE_TABLES.contains(&table) {
            return Err(format!("unknown table {}", table).into());
        }
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Runs a test body against a fresh database
///
/// The generated test is ignored unless run with `--ignored`, since it
/// needs Docker.
///
/// ```rust,ignore
/// db_test!(stores_invoice, |pool| {
///     let dao = PostgresInvoiceDao::new(pool, bus);
///     // ...
/// });
/// ```
#[macro_export]
macro_rules! db_test {
    ($name:ident, |$pool:ident| $body:block) => {
        #[tokio::test]
        #[ignore = "requires Docker"]
        async fn $name() {
            let db = $crate::database::TestDatabase::new()
                .await
                .expect("Failed to create test database");
            let $pool = db.pool().clone();
            $body
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_every_invoice_table() {
        for table in INVOICE_TABLES {
            assert!(
                SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table)),
                "schema is missing {}",
                table
            );
        }
    }
}
