use std::{net::SocketAddr, time::Duration};

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub gateway_base_url: String,
    pub gateway_api_key: String,
    pub cache_ttl: Duration,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub admin_phone: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("FT_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid FT_LISTEN_ADDR");
        let db_path = std::env::var("FT_DB_PATH").unwrap_or_else(|_| "./db/faltasi.db".into());
        let jwt_secret = crate::auth::decode_secret_key(
            &std::env::var("FT_JWT_SECRET").expect("FT_JWT_SECRET must be set"),
        )
        .expect("Invalid FT_JWT_SECRET");
        let access_ttl_secs: u64 = std::env::var("FT_ACCESS_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .unwrap_or(900);
        let refresh_ttl_secs: u64 = std::env::var("FT_REFRESH_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "604800".into())
            .parse()
            .unwrap_or(604800);
        let gateway_base_url = std::env::var("FT_GATEWAY_BASE_URL")
            .unwrap_or_else(|_| "https://api.wapangaji.example".into());
        let gateway_api_key = std::env::var("FT_GATEWAY_API_KEY").unwrap_or_default();
        let cache_ttl_secs: u64 = std::env::var("FT_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .unwrap_or(60);
        let cors_allow = std::env::var("FT_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("FT_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        let admin_phone = std::env::var("FT_ADMIN_PHONE").ok();
        let admin_password = std::env::var("FT_ADMIN_PASSWORD").ok();
        Self {
            listen_addr,
            db_path,
            jwt_secret,
            access_token_ttl: Duration::from_secs(access_ttl_secs),
            refresh_token_ttl: Duration::from_secs(refresh_ttl_secs),
            gateway_base_url,
            gateway_api_key,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            admin_phone,
            admin_password,
        }
    }
}
