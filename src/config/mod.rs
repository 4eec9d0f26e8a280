use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub statement_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the identity service; tokens are checked against `{addr}/ping`.
    pub addr: String,
    pub timeout_secs: u64,
    /// Lifetime of a positive token check. Zero disables caching.
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub max_page_size: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let database_url = database_url_from_env()?;
        let auth_addr = env::var("AUTH_ADDR").map_err(|_| ConfigError::Missing("AUTH_ADDR"))?;

        match environment {
            Environment::Production => Self::production(database_url, auth_addr),
            Environment::Staging => Self::staging(database_url, auth_addr),
            Environment::Development => Self::development(database_url, auth_addr),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(v) = env::var("SERVER_ADDR") {
            self.server.addr = v;
        }
        if let Ok(v) = env::var("PORT") {
            let port: u16 = parse_var("PORT", &v)?;
            let host = self.server.addr.rsplit_once(':').map(|(h, _)| h).unwrap_or("0.0.0.0");
            self.server.addr = format!("{}:{}", host, port);
        }
        override_parsed("SERVER_REQUEST_TIMEOUT_SECS", &mut self.server.request_timeout_secs)?;

        override_parsed("DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections)?;
        override_parsed("DATABASE_ACQUIRE_TIMEOUT_SECS", &mut self.database.acquire_timeout_secs)?;
        override_parsed("DATABASE_STATEMENT_TIMEOUT_MS", &mut self.database.statement_timeout_ms)?;

        override_parsed("AUTH_TIMEOUT_SECS", &mut self.auth.timeout_secs)?;
        override_parsed("AUTH_CACHE_TTL_SECS", &mut self.auth.cache_ttl_secs)?;

        if let Ok(v) = env::var("CORS_ALLOWED_ORIGIN") {
            self.cors.allowed_origin = v;
        }

        override_parsed("PAGINATION_MAX_PAGE_SIZE", &mut self.pagination.max_page_size)?;

        self.validate()
    }

    /// Timeouts, pool size and page size must all be at least one.
    fn validate(self) -> Result<Self, ConfigError> {
        require_positive("SERVER_REQUEST_TIMEOUT_SECS", self.server.request_timeout_secs)?;
        require_positive("DATABASE_MAX_CONNECTIONS", self.database.max_connections)?;
        require_positive("DATABASE_ACQUIRE_TIMEOUT_SECS", self.database.acquire_timeout_secs)?;
        require_positive("DATABASE_STATEMENT_TIMEOUT_MS", self.database.statement_timeout_ms)?;
        require_positive("AUTH_TIMEOUT_SECS", self.auth.timeout_secs)?;
        require_positive("PAGINATION_MAX_PAGE_SIZE", self.pagination.max_page_size)?;
        Ok(self)
    }

    pub fn development(database_url: String, auth_addr: String) -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                addr: "0.0.0.0:8080".to_string(),
                request_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 10,
                acquire_timeout_secs: 30,
                statement_timeout_ms: 30_000,
            },
            auth: AuthConfig {
                addr: auth_addr,
                timeout_secs: 10,
                cache_ttl_secs: 0,
            },
            cors: CorsConfig {
                allowed_origin: "http://localhost:5173".to_string(),
            },
            pagination: PaginationConfig { max_page_size: 1000 },
        }
    }

    pub fn staging(database_url: String, auth_addr: String) -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                addr: "0.0.0.0:8080".to_string(),
                request_timeout_secs: 15,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 20,
                acquire_timeout_secs: 10,
                statement_timeout_ms: 10_000,
            },
            auth: AuthConfig {
                addr: auth_addr,
                timeout_secs: 5,
                cache_ttl_secs: 15,
            },
            cors: CorsConfig {
                allowed_origin: "https://staging.example.com".to_string(),
            },
            pagination: PaginationConfig { max_page_size: 500 },
        }
    }

    pub fn production(database_url: String, auth_addr: String) -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                addr: "0.0.0.0:8080".to_string(),
                request_timeout_secs: 10,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 50,
                acquire_timeout_secs: 5,
                statement_timeout_ms: 5_000,
            },
            auth: AuthConfig {
                addr: auth_addr,
                timeout_secs: 3,
                cache_ttl_secs: 30,
            },
            cors: CorsConfig {
                allowed_origin: "https://app.example.com".to_string(),
            },
            pagination: PaginationConfig { max_page_size: 100 },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

/// Reads `DATABASE_URL`, or assembles one from the split `DATABASE_*` variables.
fn database_url_from_env() -> Result<String, ConfigError> {
    if let Ok(url) = env::var("DATABASE_URL") {
        return Ok(url);
    }

    let addr = env::var("DATABASE_ADDR").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
    let user = env::var("DATABASE_USER").map_err(|_| ConfigError::Missing("DATABASE_USER"))?;
    let password =
        env::var("DATABASE_PASSWORD").map_err(|_| ConfigError::Missing("DATABASE_PASSWORD"))?;
    let name = env::var("DATABASE_NAME").map_err(|_| ConfigError::Missing("DATABASE_NAME"))?;

    build_database_url(&addr, &user, &password, &name)
}

fn build_database_url(
    addr: &str,
    user: &str,
    password: &str,
    name: &str,
) -> Result<String, ConfigError> {
    let mut url = url::Url::parse(&format!("postgres://{}", addr)).map_err(|_| {
        ConfigError::Invalid {
            name: "DATABASE_ADDR",
            value: addr.to_string(),
        }
    })?;
    let invalid_credentials = |_| ConfigError::Invalid {
        name: "DATABASE_USER",
        value: user.to_string(),
    };
    url.set_username(user).map_err(invalid_credentials)?;
    url.set_password(Some(password)).map_err(invalid_credentials)?;
    url.set_path(&format!("/{}", name));
    Ok(url.into())
}

fn parse_var<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn require_positive<T>(name: &'static str, value: T) -> Result<(), ConfigError>
where
    T: PartialOrd + From<u8> + ToString,
{
    if value < T::from(1) {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn override_parsed<T: FromStr>(name: &'static str, slot: &mut T) -> Result<(), ConfigError> {
    if let Ok(v) = env::var(name) {
        *slot = parse_var(name, &v)?;
    }
    Ok(())
}
