use serde::Deserialize;

use crate::engine::DEFAULT_RECIPE_SEARCH_URL;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Prefix the product name is appended to for "view recipes" links.
    pub recipe_search_url: String,
    /// Categories shown in the dashboard histogram.
    pub dashboard_top_categories: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "freshtrack".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "freshtrack-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        Ok(Self {
            database_url,
            jwt,
            recipe_search_url: std::env::var("RECIPE_SEARCH_URL")
                .unwrap_or_else(|_| DEFAULT_RECIPE_SEARCH_URL.into()),
            dashboard_top_categories: env_or("DASHBOARD_TOP_CATEGORIES", 5),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_missing_or_garbage() {
        assert_eq!(env_or("FRESHTRACK_TEST_SURELY_UNSET", 42_i64), 42);
        std::env::set_var("FRESHTRACK_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("FRESHTRACK_TEST_GARBAGE", 7_usize), 7);
        std::env::set_var("FRESHTRACK_TEST_NUMBER", "12");
        assert_eq!(env_or("FRESHTRACK_TEST_NUMBER", 7_usize), 12);
    }
}
