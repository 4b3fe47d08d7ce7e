use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub search: SearchConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub checkout: CheckoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Hard cap applied to any catalog query limit.
    pub max_limit: i32,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// ISO currency code sent to the payment provider.
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Search overrides
        if let Ok(v) = env::var("SEARCH_MAX_LIMIT") {
            self.search.max_limit = v.parse().unwrap_or(self.search.max_limit);
        }
        if let Ok(v) = env::var("SEARCH_DEBUG_LOGGING") {
            self.search.debug_logging = v.parse().unwrap_or(self.search.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Checkout overrides
        if let Ok(v) = env::var("CHECKOUT_CURRENCY") {
            self.checkout.currency = v;
        }
        if let Ok(v) = env::var("CHECKOUT_SUCCESS_URL") {
            self.checkout.success_url = v;
        }
        if let Ok(v) = env::var("CHECKOUT_CANCEL_URL") {
            self.checkout.cancel_url = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            search: SearchConfig {
                max_limit: 1000,
                debug_logging: true,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            security: SecurityConfig {
                // Overridden by JWT_SECRET in any real deployment
                jwt_secret: "art-store-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            checkout: CheckoutConfig {
                currency: "usd".to_string(),
                success_url: "http://localhost:3000/checkout/success".to_string(),
                cancel_url: "http://localhost:3000/cart".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            search: SearchConfig {
                max_limit: 500,
                debug_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.artstore.example.com".to_string()],
            },
            checkout: CheckoutConfig {
                currency: "usd".to_string(),
                success_url: "https://staging.artstore.example.com/checkout/success".to_string(),
                cancel_url: "https://staging.artstore.example.com/cart".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            search: SearchConfig {
                max_limit: 100,
                debug_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://artstore.example.com".to_string()],
            },
            checkout: CheckoutConfig {
                currency: "usd".to_string(),
                success_url: "https://artstore.example.com/checkout/success".to_string(),
                cancel_url: "https://artstore.example.com/cart".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_profile_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.search.max_limit, 1000);
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.checkout.currency, "usd");
    }

    #[test]
    fn production_profile_defaults() {
        let config = AppConfig::production();
        assert_eq!(config.search.max_limit, 100);
        // Production has no baked-in secret; JWT_SECRET must be set
        assert!(config.security.jwt_secret.is_empty());
    }
}
