//! Database Test Utilities
//!
//! Starts PostgreSQL in a testcontainer and applies the workspace
//! migrations, for adapter tests that need a real database. Tests using
//! these helpers are `#[ignore]`d by default since they require Docker.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use core_kernel::UserId;
use domain_party::AccountStatus;
use infra_db::{run_migrations, PostgresIdentityAdapter};

const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "hiring_test";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Connection settings of a running test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated PostgreSQL running in a container
///
/// The container stops when this value is dropped.
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and runs every migration against it
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start or a migration fails
    pub async fn new() -> Result<Self, BoxError> {
        let container = Postgres::default()
            .with_user(POSTGRES_USER)
            .with_password(POSTGRES_PASSWORD)
            .with_db_name(POSTGRES_DB)
            .start()
            .await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..TestDatabaseConfig::default()
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.connection_url())
            .await?;
        run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Clears all rows while preserving the schema
    pub async fn clear_data(&self) -> Result<(), BoxError> {
        let tables = [
            "payment_events",
            "claim_compliance_submissions",
            "claim_compliances",
            "claims",
            "quotation_deliverables",
            "quotations",
            "hirings",
            "user_accounts",
        ];

        for table in tables {
            sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", table))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Registers an account standing in the identity mirror
    pub async fn seed_account(&self, user_id: UserId, status: AccountStatus) -> Result<(), BoxError> {
        PostgresIdentityAdapter::new(self.pool.clone())
            .set_status(user_id, status)
            .await?;
        Ok(())
    }
}

static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// Gets or starts the database shared by every test in the binary
///
/// # Panics
///
/// Panics if the database fails to initialize
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

/// Starts a database owned by a single test
pub async fn create_isolated_test_database() -> Result<TestDatabase, BoxError> {
    TestDatabase::new().await
}

/// Declares an ignored tokio test that receives an isolated database
#[macro_export]
macro_rules! db_test {
    ($name:ident, |$db:ident| $body:block) => {
        #[tokio::test]
        #[ignore = "requires Docker"]
        async fn $name() {
            let $db = $crate::database::create_isolated_test_database()
                .await
                .expect("Failed to create test database");
            $body
        }
    };
}
