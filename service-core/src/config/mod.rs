//! Shared configuration base.
//!
//! Every service listens on a port; service-specific config types
//! flatten this struct into their own and layer their settings on top.

use crate::error::AppError;
use config::{Config as Loader, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load from the optional `configuration` file plus `APP__`-prefixed
    /// environment variables, the environment winning. `.env` is read
    /// first so local overrides reach the environment source.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let loaded = Loader::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(loaded.try_deserialize()?)
    }
}
