use std::str::FromStr;
use std::time::Duration;

use actix_web::http::header::HeaderValue;
use actix_web::http::Uri;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("AUTH_SECRET must be at least 32 bytes long")]
    SecretTooShort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub auth_secret: Option<String>,
    pub cors_origin: String,
    pub output_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let auth_secret = dotenvy::var("AUTH_SECRET").ok();
        if auth_secret.as_ref().is_some_and(|secret| secret.len() < 32) {
            return Err(ConfigError::SecretTooShort);
        }
        Ok(Self {
            database_url: dotenvy::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            host: dotenvy::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080)?,
            environment: parse_var("APP_ENV", Environment::Development)?,
            auth_secret,
            cors_origin: parse_origin(
                dotenvy::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:4200".to_string()),
            )?,
            output_cache_ttl: Duration::from_secs(parse_var("OUTPUT_CACHE_TTL_SECS", 60)?),
        })
    }

    /// Development defaults with no database; what the test suite runs against.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: Environment::Development,
            auth_secret: None,
            cors_origin: "http://localhost:4200".to_string(),
            output_cache_ttl: Duration::from_secs(60),
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match dotenvy::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// A single browser origin: scheme and host, optionally a port, nothing else.
fn parse_origin(value: String) -> Result<String, ConfigError> {
    let valid = match value.parse::<Uri>() {
        Ok(uri) => {
            matches!(uri.scheme_str(), Some("http" | "https"))
                && uri.host().is_some_and(|host| !host.is_empty())
                && uri.path_and_query().map_or(true, |path| path.as_str().is_empty() || path.as_str() == "/")
                && !value.ends_with('/')
                && HeaderValue::from_str(&value).is_ok()
        }
        Err(_) => false,
    };
    if valid {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name: "CORS_ORIGIN",
            value,
        })
    }
}
