use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

/// Secret shipped in the defaults; startup warns when it is still in use.
pub const DEFAULT_JWT_SECRET: &str = "change-me";

/// Runtime configuration.
///
/// Loaded from built-in defaults, then overridden by `CHEMINV_*` environment
/// variables (e.g. `CHEMINV_DATABASE_URL`, `CHEMINV_JWT_SECRET`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub loglevel: String,
    pub jwt_secret: String,
    /// Token lifetime, e.g. `7d`, `12h`, `30m` or plain seconds.
    pub jwt_expires_in: String,
    pub bcrypt_cost: u32,
    /// Allow anyone to call `/auth/register` without an admin token.
    pub open_registration: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:chemical_inventory.sqlite".to_string(),
            listen_addr: "0.0.0.0:3001".to_string(),
            loglevel: "info".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expires_in: "7d".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            open_registration: false,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed("CHEMINV_"))
    }

    /// Extract the layered config. Any invalid value fails the whole load.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}
