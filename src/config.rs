//! Process configuration, read from the environment.

use std::{net::SocketAddr, time::Duration};

use secrecy::Secret;

use crate::spotify::TOKEN_URL;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("env var {0} is not set")]
    Missing(&'static str),
    #[error("env var {key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug)]
pub struct Config {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub token_url: String,
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    /// Upper bound on one credential exchange round-trip.
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let require = |key: &'static str| get(key).ok_or(Error::Missing(key));

        let bind_addr = match get("BIND_ADDR") {
            Some(value) => value
                .parse()
                .map_err(|_| Error::Invalid { key: "BIND_ADDR", value })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8000)),
        };

        let environment = match get("APP_ENV").as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => {
                return Err(Error::Invalid {
                    key: "APP_ENV",
                    value: other.to_owned(),
                })
            }
        };

        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::Invalid {
                        key: "UPSTREAM_TIMEOUT_SECS",
                        value,
                    })
                }
            },
            None => Duration::from_secs(10),
        };

        Ok(Self {
            client_id: require("SPOTIFY_CLIENT_ID")?,
            client_secret: Secret::new(require("SPOTIFY_CLIENT_SECRET")?),
            token_url: get("SPOTIFY_TOKEN_URL").unwrap_or_else(|| TOKEN_URL.to_owned()),
            bind_addr,
            environment,
            upstream_timeout,
        })
    }
}
