// --- File: crates/paybridge_config/src/models.rs ---

use serde::{Deserialize, Serialize};

/// Placeholder value that is swapped for an environment variable at load time.
pub const SECRET_FROM_ENV: &str = "secret_from_env";

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for unmatched paths (the browser client).
    #[serde(default)]
    pub static_dir: Option<String>,
}

// --- Identifier Store Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    /// Path of the SQLite file, created if missing.
    pub path: String,
    /// How long `open` waits on a locked file before giving up.
    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

// --- Stripe Config ---
// Both keys are normally "secret_from_env" in the config file and resolved from
// STRIPE_SECRET_KEY / STRIPE_PUBLISHABLE_KEY.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub publishable_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// API version pinned on ephemeral keys handed to mobile clients.
    #[serde(default = "default_ephemeral_key_version")]
    pub ephemeral_key_version: String,
    /// Customer billed by the /create-invoice demo endpoint.
    #[serde(default = "default_demo_customer_id")]
    pub demo_customer_id: String,
    #[serde(default = "default_payment_amount")]
    pub payment_amount: i64,
    #[serde(default = "default_charge_amount")]
    pub charge_amount: i64,
    #[serde(default = "default_currency")]
    pub charge_currency: String,
    #[serde(default = "default_payment_amount")]
    pub invoice_amount: i64,
    #[serde(default = "default_currency")]
    pub invoice_currency: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub stripe: StripeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Returns the names of required secrets that are empty or still carry the
    /// `secret_from_env` marker.
    pub fn missing_secrets(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_unresolved(&self.stripe.secret_key) {
            missing.push("stripe.secret_key");
        }
        if is_unresolved(&self.stripe.publishable_key) {
            missing.push("stripe.publishable_key");
        }
        missing
    }
}

fn is_unresolved(value: &str) -> bool {
    value.trim().is_empty() || value == SECRET_FROM_ENV
}

fn default_open_timeout_ms() -> u64 {
    2000
}

fn default_max_connections() -> u32 {
    5
}

fn default_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_ephemeral_key_version() -> String {
    "2020-08-27".to_string()
}

fn default_demo_customer_id() -> String {
    "cus_Jl6aiT1bRvWZAh".to_string()
}

fn default_payment_amount() -> i64 {
    1999
}

fn default_charge_amount() -> i64 {
    1099
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
