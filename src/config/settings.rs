//! Runtime settings from environment variables. Binaries load `.env` before calling [`Settings::from_env`].

use crate::error::ConfigError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 1000;
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_ROUTE_PREFIX: &str = "/api/app";

/// Paging defaults applied to `GetList` requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagingSettings {
    /// Used when `maxResultCount` is absent.
    pub default_page_size: u64,
    /// Upper bound for `maxResultCount`; larger requests are rejected.
    pub max_page_size: u64,
}

impl Default for PagingSettings {
    fn default() -> Self {
        PagingSettings {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub paging: PagingSettings,
    pub body_limit: usize,
    pub bind_addr: String,
    pub route_prefix: String,
    pub database_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            paging: PagingSettings::default(),
            body_limit: DEFAULT_BODY_LIMIT,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
            database_url: None,
        }
    }
}

impl Settings {
    /// Read `CRUD_*` variables and `DATABASE_URL` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let paging = PagingSettings {
            default_page_size: parse_or(&lookup, "CRUD_DEFAULT_PAGE_SIZE", defaults.paging.default_page_size)?,
            max_page_size: parse_or(&lookup, "CRUD_MAX_PAGE_SIZE", defaults.paging.max_page_size)?,
        };
        if paging.default_page_size == 0 || paging.max_page_size == 0 {
            return Err(ConfigError::Settings("page sizes must be positive".into()));
        }
        if paging.default_page_size > paging.max_page_size {
            return Err(ConfigError::Settings(format!(
                "CRUD_DEFAULT_PAGE_SIZE ({}) exceeds CRUD_MAX_PAGE_SIZE ({})",
                paging.default_page_size, paging.max_page_size
            )));
        }
        let route_prefix = normalize_prefix(
            &lookup("CRUD_ROUTE_PREFIX").unwrap_or(defaults.route_prefix),
        );
        Ok(Settings {
            paging,
            body_limit: parse_or(&lookup, "CRUD_BODY_LIMIT_BYTES", defaults.body_limit)?,
            bind_addr: lookup("CRUD_BIND_ADDR").unwrap_or(defaults.bind_addr),
            route_prefix,
            database_url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Settings(format!("{} must be a non-negative integer, got '{}'", key, raw))),
        None => Ok(default),
    }
}

/// "/api/app/" -> "/api/app", "api" -> "/api", "/" or "" -> "".
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
