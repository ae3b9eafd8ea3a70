//! Test databases
//!
//! Every [`TestDb`] is its own database inside one shared `PostgreSQL` container, with the
//! migrations applied. Tests never see each other's rows.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool, Postgres, Transaction};
use testcontainers::{ContainerAsync, ImageExt, TestcontainersError, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use testresult::TestResult;
use tokio::sync::{OnceCell, mpsc};
use tracing::warn;
use uuid::Uuid;

use crate::database::{self, Db};

const USER: &str = "tiffin_test";
const PASSWORD: &str = "tiffin_test_password";

static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

static CLEANUP_SENDER: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

/// Rejects names that are unsafe to splice into `CREATE DATABASE`.
fn validate_database_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > 63 {
        return Err(format!("database name '{name}' must be 1-63 characters long"));
    }

    if !name
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
    {
        return Err(format!("database name '{name}' must start with a letter or underscore"));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        return Err(format!(
            "database name '{name}' may only contain letters, digits, underscores and dollar signs"
        ));
    }

    Ok(())
}

async fn init_postgres_container() -> Result<ContainerAsync<PostgresImage>, TestcontainersError> {
    PostgresImage::default()
        .with_user(USER)
        .with_password(PASSWORD)
        .with_db_name("tiffin_test")
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
}

async fn init_cleanup_task() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(name) = receiver.recv().await {
            if let Err(error) = drop_database(&name).await {
                warn!(%name, ?error, "failed to drop test database");
            }
        }
    });

    sender
}

async fn server_url(database: &str) -> TestResult<String> {
    let container = POSTGRES_CONTAINER
        .get_or_try_init(init_postgres_container)
        .await?;

    let port = container.get_host_port_ipv4(5432).await?;

    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    Ok(format!("postgresql://{USER}:{PASSWORD}@{host}:{port}/{database}"))
}

async fn drop_database(name: &str) -> TestResult {
    validate_database_name(name)?;

    let mut conn = PgConnection::connect(&server_url("postgres").await?).await?;

    sqlx::query(&format!("DROP DATABASE IF EXISTS \"{name}\""))
        .execute(&mut conn)
        .await?;

    conn.close().await?;

    Ok(())
}

/// An isolated, migrated database, dropped when the value goes out of scope.
#[derive(Debug, Clone)]
pub(crate) struct TestDb {
    pool: PgPool,
    name: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = CLEANUP_SENDER.get()
            && sender.send(self.name.clone()).is_err()
        {
            warn!(name = %self.name, "test database cleanup task has stopped");
        }
    }
}

impl TestDb {
    pub(crate) async fn new() -> TestResult<Self> {
        let name = format!("tiffin_test_{}", Uuid::now_v7().simple());

        validate_database_name(&name)?;

        CLEANUP_SENDER.get_or_init(init_cleanup_task).await;

        let mut conn = PgConnection::connect(&server_url("postgres").await?).await?;

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await?;

        conn.close().await?;

        let pool = database::connect(&server_url(&name).await?).await?;

        database::migrate(&pool).await?;

        Ok(Self { pool, name })
    }

    /// A transaction that rolls back when dropped, for repository tests.
    pub(crate) async fn begin_test_transaction(&self) -> TestResult<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) fn db(&self) -> Db {
        Db::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_valid() {
        let name = format!("tiffin_test_{}", Uuid::now_v7().simple());

        assert_eq!(validate_database_name(&name), Ok(()));
    }

    #[test]
    fn names_must_start_with_a_letter_or_underscore() {
        assert!(validate_database_name("_scratch").is_ok());
        assert!(validate_database_name("1scratch").is_err());
        assert!(validate_database_name("$scratch").is_err());
    }

    #[test]
    fn names_cannot_break_out_of_quotes() {
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name(&"a".repeat(64)).is_err());
        assert!(validate_database_name("bad\"; DROP DATABASE postgres; --").is_err());
        assert!(validate_database_name("has space").is_err());
    }

    #[tokio::test]
    async fn databases_are_migrated() -> TestResult {
        let db = TestDb::new().await?;

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name IN ('menu_items', 'promotions', 'orders', 'order_items', 'session_values', 'customer_baskets')",
        )
        .fetch_one(db.pool())
        .await?;

        assert_eq!(tables, 6);

        Ok(())
    }

    #[tokio::test]
    async fn test_transactions_roll_back_on_drop() -> TestResult {
        let db = TestDb::new().await?;

        {
            let mut tx = db.begin_test_transaction().await?;

            sqlx::query("INSERT INTO session_values (session_uuid, key, value) VALUES ($1, 'basket', '{}')")
                .bind(Uuid::now_v7())
                .execute(&mut *tx)
                .await?;
        }

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM session_values")
            .fetch_one(db.pool())
            .await?;

        assert_eq!(rows, 0);

        Ok(())
    }
}
