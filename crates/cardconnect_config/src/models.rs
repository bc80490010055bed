use serde::{Deserialize, Serialize};

fn default_currency() -> String {
    "USD".to_string()
}

// --- CardPointe Config ---
// The password may be written as "secret_from_env" and is then read from
// the CARDPOINTE_PASSWORD environment variable.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CardPointeConfig {
    pub merchant_id: String, // Mandatory
    pub username: String,    // Mandatory
    #[serde(default)]
    pub password: Option<String>,
    pub endpoint: String, // e.g. https://fts-uat.cardconnect.com/
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Skip TLS certificate verification (sandbox gateways only).
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub cardpointe: Option<CardPointeConfig>,
}
