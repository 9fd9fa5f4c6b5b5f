#[cfg(test)]
pub mod test_utils {
    use crate::auth::issue_token;
    use crate::config::AppConfig;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use migration::{Migrator, MigratorTrait};
    use model::entities::user::{self, Role};
    use model::entities::{assignment, product};
    use moka::future::Cache;
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 1,
            cors_origins: vec!["http://localhost:3000".to_string()],
            image_service_url: None,
            image_service_key: None,
        }
    }

    /// One seeded account per role, plus the shared state.
    pub struct TestEnv {
        pub state: AppState,
        pub superadmin: user::Model,
        pub admin: user::Model,
        pub salesman: user::Model,
        pub shopkeeper: user::Model,
    }

    impl TestEnv {
        /// Bearer token for a seeded (or freshly created) user.
        pub fn token_for(&self, user: &user::Model) -> String {
            issue_token(user, &self.state.config.jwt_secret, 1).expect("Failed to issue test token")
        }
    }

    /// Low bcrypt cost to keep the test suite fast.
    pub fn test_password_hash(password: &str) -> String {
        bcrypt::hash(password, 4).expect("Failed to hash test password")
    }

    pub async fn seed_user(
        db: &DatabaseConnection,
        name: &str,
        email: &str,
        role: Role,
        commission_rate: Option<Decimal>,
    ) -> user::Model {
        user::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(test_password_hash("password123")),
            role: Set(role),
            is_active: Set(true),
            commission_rate: Set(commission_rate),
            pending_amount: Set(Decimal::ZERO),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed user")
    }

    pub async fn seed_product(
        db: &DatabaseConnection,
        name: &str,
        price: Decimal,
        stock: i32,
    ) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            price: Set(price),
            stock: Set(stock),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed product")
    }

    pub async fn seed_assignment(
        db: &DatabaseConnection,
        salesman_id: i32,
        shopkeeper_id: i32,
        assigned_by: i32,
    ) -> assignment::Model {
        assignment::ActiveModel {
            salesman_id: Set(salesman_id),
            shopkeeper_id: Set(shopkeeper_id),
            assigned_by: Set(assigned_by),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed assignment")
    }

    /// Create AppState for testing with one user per role
    pub async fn setup_test_env() -> TestEnv {
        let db = setup_test_db().await;

        let superadmin = seed_user(&db, "Root", "root@test.local", Role::Superadmin, None).await;
        let admin = seed_user(&db, "Admin", "admin@test.local", Role::Admin, None).await;
        let salesman = seed_user(
            &db,
            "Sam Salesman",
            "sam@test.local",
            Role::Salesman,
            Some(Decimal::new(10, 0)),
        )
        .await;
        let shopkeeper =
            seed_user(&db, "Shop Keeper", "shop@test.local", Role::Shopkeeper, None).await;

        let cache = Cache::new(100);
        let state = AppState {
            db,
            config: Arc::new(test_config()),
            cache,
        };

        TestEnv {
            state,
            superadmin,
            admin,
            salesman,
            shopkeeper,
        }
    }

    /// Initialize tracing for tests with output to STDERR. The log
    /// level comes from RUST_LOG, defaulting to WARN.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app plus seeded accounts for testing
    pub async fn setup_test_app() -> (Router, TestEnv) {
        let _ = init_test_tracing();

        let env = setup_test_env().await;
        let router = create_router(env.state.clone());
        (router, env)
    }
}
