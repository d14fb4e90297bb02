//! Application settings, read from an optional `settings.toml` in the
//! working directory and overridden by `PLUGIN_CATALOG__*` environment
//! variables (e.g. `PLUGIN_CATALOG__SERVER__PORT=8080`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Media {
    /// Directory uploads are written to.
    pub root: String,
    /// URL prefix media files are served under.
    pub base_url: String,
    pub default_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub media: Media,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.port", 3000)?
            .set_default("server.database", "memory")?
            .set_default("media.root", "./media")?
            .set_default("media.base_url", "/media/")?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("PLUGIN_CATALOG").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
