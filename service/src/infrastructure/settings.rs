use std::env;
use std::time::Duration;

use anyhow::Context;
use config::{Config, Environment, File};
use dotenvy::dotenv;
use lectern_common::database::DatabaseSettings;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_port: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub identity: IdentitySettings,
    pub database: DatabaseSettings,
}

/// Names of the trusted headers carrying the caller identity.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySettings {
    pub user_header: String,
    pub role_header: String,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            user_header: "x-user-id".to_string(),
            role_header: "x-user-role".to_string(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        let run_mode = load_env("RUN_MODE", "development");

        let s = Config::builder()
            .add_source(File::with_name("./config/default"))
            .add_source(File::with_name(&format!("./config/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("app").separator("__"))
            .build()?;

        s.try_deserialize().with_context(|| "failed to read config")
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

fn load_env(key: &str, default_value: &'static str) -> String {
    env::var(key).unwrap_or_else(|_| default_value.into())
}
