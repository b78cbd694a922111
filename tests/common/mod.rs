#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use finance_sim::{
    account::repository::AccountRepository,
    auth::{
        controller::AuthController, model::CurrentUser, model::LoginRequest,
        model::RegisterRequest, repository::AuthRepository, service::AuthService,
        session::SessionStore,
    },
    db::Database,
    error::CustomError,
    ledger::repository::LedgerRepository,
    quote::{QuoteProvider, model::Quote},
    trade::{controller::TradeController, service::TradeService},
};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::{AnyPool, any::install_default_drivers};

pub const STARTING_CASH: i64 = 1_000_000;
pub const SECRET: &str = "test-session-secret";

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}

pub async fn setup_test_db() -> AnyPool {
    install_default_drivers();
    let db_name = format!("test_{}", random_suffix());
    let database_url = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);

    // Create the pool (which will internally use shared memory DB)
    let pool = AnyPool::connect(&database_url)
        .await
        .expect("Failed to create in-memory SQLite DB");
    Database::migrate(&pool, &database_url)
        .await
        .expect("Failed to create test tables");

    pool
}

/// File-backed database, for tests that need real concurrent writers.
pub async fn setup_file_db() -> AnyPool {
    install_default_drivers();
    let path = std::env::temp_dir().join(format!("finance_sim_{}.db", random_suffix()));
    let database_url = format!("sqlite://{}?mode=rwc", path.display());

    let pool = Database::new_pool(&database_url)
        .await
        .expect("Failed to create SQLite file DB");
    Database::migrate(&pool, &database_url)
        .await
        .expect("Failed to create test tables");

    pool
}

/// In-memory quote source with adjustable prices.
#[derive(Default)]
pub struct StaticQuotes {
    prices: Mutex<HashMap<String, Decimal>>,
    lookups: AtomicUsize,
}

impl StaticQuotes {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, symbol: &str, price: Decimal) {
        self.prices
            .lock()
            .unwrap()
            .insert(symbol.to_string(), price);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for StaticQuotes {
    async fn lookup(&self, symbol: &str) -> Result<Quote, CustomError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let price = self.prices.lock().unwrap().get(symbol).copied();
        price
            .map(|price| Quote {
                symbol: symbol.to_string(),
                name: format!("{} Inc.", symbol),
                price,
            })
            .ok_or_else(|| CustomError::QuoteUnavailable(symbol.to_string()))
    }
}

pub struct TestApp {
    pub pool: AnyPool,
    pub quotes: Arc<StaticQuotes>,
    pub sessions: Arc<SessionStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_pool(setup_test_db().await)
    }

    pub fn with_pool(pool: AnyPool) -> Self {
        TestApp {
            pool,
            quotes: StaticQuotes::new(),
            sessions: Arc::new(SessionStore::new(SECRET, chrono::Duration::hours(1))),
        }
    }

    pub async fn auth_service(&self) -> AuthService {
        let repository = AuthRepository::new(self.pool.clone())
            .await
            .expect("Failed create repo");
        AuthService::new(repository, Arc::clone(&self.sessions), STARTING_CASH)
    }

    pub fn trade_service(&self) -> TradeService {
        TradeService::new(
            AccountRepository::new(self.pool.clone()),
            LedgerRepository::new(self.pool.clone()),
            self.quotes.clone(),
        )
    }

    pub async fn controllers(&self) -> (AuthController, TradeController) {
        (
            AuthController::new(self.auth_service().await),
            TradeController::new(self.trade_service()),
        )
    }

    /// Registers `username` and logs in, returning the session token.
    pub async fn signed_in(&self, username: &str) -> (CurrentUser, String) {
        let auth = self.auth_service().await;
        auth.register(&RegisterRequest {
            username: username.to_string(),
            password: "hunter2".to_string(),
            confirmation: "hunter2".to_string(),
        })
        .await
        .expect("Failed to register");
        let token = auth
            .login(
                &LoginRequest {
                    username: username.to_string(),
                    password: "hunter2".to_string(),
                },
                &HashMap::new(),
            )
            .await
            .expect("Failed to login");
        let user = self.sessions.resolve(&token).await.expect("Invalid session");
        (user, token)
    }

    pub async fn cash(&self, user_id: i64) -> i64 {
        AccountRepository::new(self.pool.clone())
            .cash(user_id)
            .await
            .expect("Failed to read cash")
    }

    pub async fn ledger_rows(&self, user_id: i64) -> Vec<(String, i64, i64)> {
        sqlx::query_as(
            "SELECT stock, shares, price FROM transactions WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .expect("Failed to read ledger")
    }
}
