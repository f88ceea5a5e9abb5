use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_mark_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub cors_allowed_origins: Vec<String>,

    /// Password for the seeded administrator; only read when the directory is empty.
    pub admin_default_password: Option<String>,
    pub seed_sample_attendance: bool,

    // Spreadsheet export
    pub report_title: String,
    pub report_logo_path: String,

    pub log_dir: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(key, default)
        .trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: var_or("SERVER_ADDR", "127.0.0.1:5000"),
            database_url: var_or("DATABASE_URL", "sqlite://data/attendance.db"),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: parse_var("ACCESS_TOKEN_TTL", "900")?, // default 15 min
            refresh_token_ttl: parse_var("REFRESH_TOKEN_TTL", "604800")?, // default 7 days

            rate_login_per_min: parse_var("RATE_LOGIN_PER_MIN", "60")?,
            rate_refresh_per_min: parse_var("RATE_REFRESH_PER_MIN", "30")?,
            rate_mark_per_min: parse_var("RATE_MARK_PER_MIN", "120")?,
            rate_protected_per_min: parse_var("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: var_or("API_PREFIX", "/api"),
            cors_allowed_origins: split_origins(&var_or(
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:3000,http://localhost:3001,https://localhost:3000",
            )),

            admin_default_password: env::var("ADMIN_DEFAULT_PASSWORD")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            seed_sample_attendance: parse_var("SEED_SAMPLE_ATTENDANCE", "false")?,

            report_title: var_or("REPORT_TITLE", "Attendance Report"),
            report_logo_path: var_or("REPORT_LOGO_PATH", "assets/logo.png"),

            log_dir: var_or("LOG_DIR", "logs"),
        })
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
impl Config {
    /// Settings used by the in-process HTTP tests.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 1000,
            rate_refresh_per_min: 1000,
            rate_mark_per_min: 1000,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            cors_allowed_origins: vec![],
            admin_default_password: Some("Admin123!".to_string()),
            seed_sample_attendance: false,
            report_title: "Attendance Report".to_string(),
            report_logo_path: "does/not/exist.png".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_empty_entries_dropped() {
        let origins = split_origins(" http://a.test , ,http://b.test,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }
}
