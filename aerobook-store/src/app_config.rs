use serde::Deserialize;
use std::env;
use uuid::Uuid;
use aerobook_core::account::{Admin, Permission, User};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Accounts loaded into the memory backend at startup. Postgres ignores it.
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub admins: Vec<SeedAdmin>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedAdmin {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl SeedConfig {
    pub fn users(&self) -> Vec<User> {
        self.users.iter()
            .map(|u| User { id: u.id, name: u.name.clone(), email: u.email.clone(), bookings: Vec::new() })
            .collect()
    }

    pub fn admins(&self) -> Vec<Admin> {
        self.admins.iter()
            .map(|a| Admin { id: a.id, email: a.email.clone(), permissions: a.permissions.clone(), managed_flights: Vec::new() })
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Razorpay,
    Mock,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub provider: PaymentProvider,
    pub key_id: String,
    pub key_secret: String,
    #[serde(default = "default_gateway_url")]
    pub base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_gateway_timeout")]
    pub timeout_seconds: u64,
}

fn default_gateway_url() -> String { "https://api.razorpay.com/v1".to_string() }
fn default_currency() -> String { "INR".to_string() }
fn default_gateway_timeout() -> u64 { 10 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load_from("config", &run_mode)
    }

    /// Layer `default`, then `run_mode`, then `local` from `dir`, then the environment.
    pub fn load_from(dir: &str, run_mode: &str) -> Result<Self, config::ConfigError> {
        let s = config::Config::builder()
            .add_source(config::File::with_name(&format!("{}/default", dir)))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            // Eg. `AEROBOOK_PAYMENT__KEY_SECRET=...` sets `payment.key_secret`
            .add_source(config::Environment::with_prefix("AEROBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
