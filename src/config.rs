use std::net::SocketAddr;

use anyhow::Context;

const DEV_JWT_SECRET: &str = "moviedb-insecure-development-secret";

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub page_size: u64,
    pub max_page_size: u64,
    pub password_min_length: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://moviedb.db?mode=rwc".to_string());

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, signing tokens with the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let token_ttl_minutes: i64 =
            std::env::var("TOKEN_TTL_MINUTES").ok().and_then(|s| s.parse().ok()).unwrap_or(60);

        let page_size: u64 =
            std::env::var("PAGE_SIZE").ok().and_then(|s| s.parse().ok()).unwrap_or(20);

        let max_page_size: u64 =
            std::env::var("MAX_PAGE_SIZE").ok().and_then(|s| s.parse().ok()).unwrap_or(100);

        let password_min_length: usize =
            std::env::var("PASSWORD_MIN_LENGTH").ok().and_then(|s| s.parse().ok()).unwrap_or(8);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            jwt_secret,
            token_ttl_minutes,
            page_size: page_size.max(1),
            max_page_size: max_page_size.max(1),
            password_min_length,
        })
    }

    /// Settings for an in-memory database, used by the integration tests.
    pub fn for_tests() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 0).into(),
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            token_ttl_minutes: 15,
            page_size: 20,
            max_page_size: 100,
            password_min_length: 8,
        }
    }
}
