//! Database Test Utilities
//!
//! Starts a PostgreSQL container, applies the billing migrations and
//! hands out a pool. Tests that use it need a Docker daemon and are
//! marked `#[ignore]`; run them with `cargo test -- --ignored`.

use std::sync::Arc;

use core_kernel::{ShopId, UserId};
use domain_shop::MembershipRole;
use infra_db::{create_pool, run_migrations, DatabasePool, DatabaseSettings};
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::ContainerAsync;
use tokio::sync::OnceCell;
use uuid::Uuid;

type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const POSTGRES_USER: &str = "postgres";
const POSTGRES_PASSWORD: &str = "postgres";
const POSTGRES_DB: &str = "postgres";

/// Connection details of a test database
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
    /// Creates the database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated PostgreSQL test container
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub config: TestDatabaseConfig,
    pub pool: DatabasePool,
}

impl TestDatabase {
    /// Starts a container and applies the billing migrations
    pub async fn new() -> TestResult<Self> {
        let container = Postgres::default().start().await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..Default::default()
        };

        let pool = create_pool(&DatabaseSettings {
            url: config.connection_url(),
            max_connections: 5,
            min_connections: 1,
            ..Default::default()
        })
        .await?;
        run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Grants a membership directly, since no port writes memberships
    pub async fn grant_membership(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        role: MembershipRole,
    ) -> TestResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shop_users (membership_id, shop_id, user_id, role, is_active)
            VALUES ($1, $2, $3, $4::shop_role, TRUE)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(Uuid::from(shop_id))
        .bind(Uuid::from(user_id))
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Clears all data while keeping the schema
    pub async fn clear_data(&self) -> TestResult<()> {
        for table in ["payments", "bill_items", "bills", "items", "customers", "shop_users"] {
            sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", table))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// Gets or starts a database shared by every test in the binary
///
/// Tests sharing it must scope their data by fresh shop ids.
///
/// # Panics
///
/// Panics if the container cannot be started
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
