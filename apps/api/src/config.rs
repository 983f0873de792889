use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
    pub otp_ttl_secs: u64,
    pub smtp: Option<SmtpConfig>,
    pub cors_origin: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

/// SMTP settings. Absent when `SMTP_HOST` is unset, in which case mail is only logged.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_ttl_days: parse_env("JWT_TTL_DAYS", 30)?,
            otp_ttl_secs: parse_env("OTP_TTL_SECS", 600)?,
            smtp: smtp_from_env()?,
            cors_origin: std::env::var("CORS_ORIGIN").ok(),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn smtp_from_env() -> Result<Option<SmtpConfig>> {
    let Ok(host) = std::env::var("SMTP_HOST") else {
        return Ok(None);
    };
    let username = std::env::var("SMTP_USERNAME").ok();
    let from = std::env::var("MAIL_FROM")
        .ok()
        .or_else(|| username.clone())
        .context("MAIL_FROM (or SMTP_USERNAME) must be set when SMTP_HOST is set")?;

    Ok(Some(SmtpConfig {
        host,
        port: parse_env("SMTP_PORT", 587)?,
        username,
        password: std::env::var("SMTP_PASSWORD").ok(),
        from,
    }))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
