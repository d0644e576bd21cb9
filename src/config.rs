use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_PUBLIC_METHODS: &str = "set_password";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_SWEEP_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: Option<String>,
    pub admin_token: Option<String>,
    pub public_methods: Vec<String>,
    pub cache_ttl_secs: u64,
    pub cache_sweep_secs: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            database_url: get_env_opt("DATABASE_URL"),
            admin_token: get_env_opt("ADMIN_TOKEN"),
            public_methods: parse_method_list(&get_env_or(
                "PUBLIC_METHODS",
                DEFAULT_PUBLIC_METHODS,
            )),
            cache_ttl_secs: get_env_parse_or("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
            cache_sweep_secs: get_env_parse_or("CACHE_SWEEP_SECS", DEFAULT_CACHE_SWEEP_SECS)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            database_url: None,
            admin_token: None,
            public_methods: parse_method_list(DEFAULT_PUBLIC_METHODS),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_sweep_secs: DEFAULT_CACHE_SWEEP_SECS,
        }
    }
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

fn parse_method_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
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
