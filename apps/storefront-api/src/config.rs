//! Configuration for the Storefront API

use core_config::{app_info, server::ServerConfig, AppInfo, FromEnv};
use database::mongodb::MongoConfig;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mut mongodb = MongoConfig::from_env()?;
        if mongodb.app_name.is_none() {
            mongodb = mongodb.with_app_name(env!("CARGO_PKG_NAME"));
        }
        let server = ServerConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            mongodb,
            server,
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGO_URL", None),
                ("MONGODB_DATABASE", None),
                ("MONGODB_APP_NAME", None),
                ("MONGO_DATABASE", None),
                ("APP_ENV", None),
                ("HOST", None),
                ("PORT", None),
                ("CORS_ALLOWED_ORIGIN", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.mongodb.database(), "storefront");
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.environment, Environment::Development);
                assert_eq!(config.app.name, "storefront_api");
                assert_eq!(config.mongodb.app_name.as_deref(), Some("storefront_api"));
            },
        );
    }

    #[test]
    fn test_from_env_requires_mongo_url() {
        temp_env::with_vars(
            [("MONGODB_URL", None::<&str>), ("MONGO_URL", None)],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }
}
