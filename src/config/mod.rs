use config::{Config as Cfg, File};
use secrecy::Secret;
use serde::Deserialize;
use std::env;

use crate::error::DraftError;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_MINUTE_LIMIT: u64 = 3;
const DEFAULT_DAILY_LIMIT: u64 = 20;

/// Instruction sent with every generation request unless SYSTEM_PROMPT
/// overrides it.
const DEFAULT_SYSTEM_PROMPT: &str = "Return only the email text. Draft the message TO Caleb Carhart (recipient), not from him. Optional 'Subject:' then body. Keep under 120 words, friendly, one ask, simple sign-off. No meta/markdown.";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl ServerConfig {
    pub fn load() -> Result<Self, DraftError> {
        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub minute_limit: u64,
    pub daily_limit: u64,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Absent key is not a startup error; requests answer 500 until it is
    /// set.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub system_prompt: String,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct DraftConfig {
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub upstream: UpstreamConfig,
    pub redis: RedisConfig,
}

impl DraftConfig {
    pub fn load() -> Result<Self, DraftError> {
        dotenvy::dotenv().ok();

        Ok(DraftConfig {
            server: ServerConfig::load()?,
            rate_limit: RateLimitConfig {
                minute_limit: get_env_u64("MINUTE_LIMIT", DEFAULT_MINUTE_LIMIT)?,
                daily_limit: get_env_u64("DAILY_LIMIT", DEFAULT_DAILY_LIMIT)?,
            },
            upstream: UpstreamConfig {
                api_key: env::var("GEMINI_API_KEY")
                    .ok()
                    .filter(|key| !key.is_empty())
                    .map(Secret::new),
                model: get_env("MODEL", DEFAULT_MODEL),
                system_prompt: get_env("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            },
            redis: RedisConfig {
                url: get_env("REDIS_URL", DEFAULT_REDIS_URL),
            },
        })
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_u64(key: &str, default: u64) -> Result<u64, DraftError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| {
            DraftError::Config(anyhow::anyhow!(
                "{} must be a non-negative integer, got {:?}",
                key,
                raw
            ))
        }),
        Err(_) => Ok(default),
    }
}
