use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub admin_password: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub storage_api_url: String,
    pub storage_service_key: String,
    pub storage_bucket: String,
    pub app_base_url: String,
    pub public_rps: u32,
    pub admin_rps: u32,
    pub secure_cookies: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            admin_password: get_env("ADMIN_PASSWORD")?,
            groq_api_key: get_env("GROQ_API_KEY")?,
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            storage_api_url: get_env("STORAGE_API_URL")?,
            storage_service_key: get_env("STORAGE_SERVICE_KEY")?,
            storage_bucket: get_env("STORAGE_BUCKET")?,
            app_base_url: get_env("APP_BASE_URL")?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            admin_rps: get_env_parse("ADMIN_RPS")?,
            secure_cookies: env::var("SECURE_COOKIES")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
