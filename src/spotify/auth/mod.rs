//! Credential exchange with the accounts service.

pub mod refresh_token;
pub mod token_supplier;

use serde::Deserialize;

/// Trades a refresh token for a fresh access token.
#[async_trait::async_trait]
pub trait RefreshGrant: Send + Sync {
    type Error: ExchangeError;

    async fn refresh(&self, refresh_token: &str) -> Result<Grant, Self::Error>;
}

pub trait ExchangeError: std::error::Error + Send + Sync + 'static {
    /// Status code the authorization server answered with when it turned
    /// the exchange down. `None` for every other kind of failure.
    fn rejected_status(&self) -> Option<u16>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Grant {
    /// The newly issued access token.
    pub access_token: String,
    /// Always `Bearer` for Spotify.
    #[serde(default)]
    pub token_type: String,
    /// Space-separated scopes granted to the access token.
    #[serde(default)]
    pub scope: String,
    /// The amount of time that the access token is valid (in seconds).
    pub expires_in: u64,
    /// Present only when the server rotated the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
}
