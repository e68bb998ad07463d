use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use faltasi_core::{
    cache::{Cache, MemoryCache},
    db,
    dividends::DividendService,
    offerings::OfferingService,
    payments::{PaymentService, WapangajiClient},
    portfolio::PortfolioService,
    transactions::TransactionService,
    users::{NewUser, UserRepository, UserRole, UserService},
};

use crate::{auth::AuthManager, config::Config};

pub struct AppState {
    pub pool: Arc<db::DbPool>,
    pub user_service: Arc<UserService>,
    pub offering_service: Arc<OfferingService>,
    pub transaction_service: Arc<TransactionService>,
    pub payment_service: Arc<PaymentService>,
    pub dividend_service: Arc<DividendService>,
    pub portfolio_service: Arc<PortfolioService>,
    pub auth: Arc<AuthManager>,
}

pub fn init_tracing() {
    let fmt_layer = fmt::layer().json().with_current_span(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    // Keep DATABASE_URL aligned with FT_DB_PATH so core picks the right file
    std::env::set_var("DATABASE_URL", &config.db_path);
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let gateway = Arc::new(WapangajiClient::new(
        config.gateway_base_url.clone(),
        config.gateway_api_key.clone(),
    ));

    let auth = Arc::new(AuthManager::new(
        &config.jwt_secret,
        config.access_token_ttl,
        config.refresh_token_ttl,
    ));

    let user_service = Arc::new(UserService::new(pool.clone()));
    let offering_service = Arc::new(OfferingService::new(
        pool.clone(),
        cache.clone(),
        config.cache_ttl,
    ));
    let transaction_service = Arc::new(TransactionService::new(
        pool.clone(),
        gateway,
        cache.clone(),
        config.cache_ttl,
    ));
    let payment_service = Arc::new(PaymentService::new(pool.clone(), cache.clone()));
    let dividend_service = Arc::new(DividendService::new(pool.clone()));
    let portfolio_service = Arc::new(PortfolioService::new(
        pool.clone(),
        cache.clone(),
        config.cache_ttl,
    ));

    seed_admin(config, &auth, &pool)?;

    Ok(Arc::new(AppState {
        pool,
        user_service,
        offering_service,
        transaction_service,
        payment_service,
        dividend_service,
        portfolio_service,
        auth,
    }))
}

/// Creates the bootstrap admin account when FT_ADMIN_PHONE and
/// FT_ADMIN_PASSWORD are set and the phone is not registered yet.
fn seed_admin(
    config: &Config,
    auth: &AuthManager,
    pool: &Arc<db::DbPool>,
) -> anyhow::Result<()> {
    let (Some(phone), Some(password)) = (&config.admin_phone, &config.admin_password) else {
        return Ok(());
    };

    let repository = UserRepository::new(pool.clone());
    if repository.phone_exists(phone).map_err(anyhow::Error::new)? {
        return Ok(());
    }

    let password_hash = auth
        .hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e:?}"))?;
    repository
        .create(NewUser {
            name: "Administrator".to_string(),
            phone: phone.clone(),
            password_hash,
            role: UserRole::Admin,
        })
        .map_err(anyhow::Error::new)?;
    tracing::info!("Seeded bootstrap admin account");
    Ok(())
}
