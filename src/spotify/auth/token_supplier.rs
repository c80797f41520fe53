//! Hands out a valid access token for a session, refreshing it when stale.

use std::{sync::Arc, time::Duration as StdDuration};

use dashmap::DashMap;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{ExchangeError, Grant, RefreshGrant};
use crate::{
    core::{Clock, CredentialState, SystemClock},
    spotify::ServerError,
};

/// Validity window given to a rotated refresh token.
pub const REFRESH_TOKEN_LIFETIME: Duration = Duration::days(365);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] Unauthorized),
    #[error("internal: {0}")]
    Internal(#[from] InternalError),
}

/// The session has to go through authorization again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Unauthorized {
    #[error("No refresh token found")]
    NoRefreshToken,
    #[error("Failed to refresh token")]
    RefreshRejected { status: u16 },
}

#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("credential exchange: {0}")]
    Exchange(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("credential exchange timed out after {0:?}")]
    Timeout(StdDuration),
    #[error("token lifetime of {0} seconds is out of range")]
    Lifetime(u64),
}

/// Credentials issued by a refresh that the session has to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refreshed {
    pub access_token: String,
    pub expires_at: OffsetDateTime,
    /// How long the access token and the expiry marker stay valid.
    pub lifetime: Duration,
    /// The rotated refresh token. `None` keeps the stored one.
    pub refresh_token: Option<String>,
}

impl Refreshed {
    fn from_grant(grant: Grant, now: OffsetDateTime) -> Result<Self, InternalError> {
        let Grant {
            access_token,
            expires_in,
            refresh_token,
            ..
        } = grant;
        let lifetime = i64::try_from(expires_in)
            .ok()
            .map(Duration::seconds)
            .ok_or(InternalError::Lifetime(expires_in))?;
        let expires_at = now
            .checked_add(lifetime)
            .ok_or(InternalError::Lifetime(expires_in))?;
        Ok(Self {
            access_token,
            expires_at,
            lifetime,
            refresh_token,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supply {
    pub access_token: String,
    /// Set when the token was obtained from the authorization server.
    pub refreshed: Option<Refreshed>,
}

type Slot = Arc<Mutex<Option<Refreshed>>>;

pub struct TokenSupplier<Exchange, C = SystemClock> {
    exchange: Exchange,
    clock: C,
    timeout: StdDuration,
    /// Refreshes in flight, keyed by the presented refresh token. An entry
    /// lives only while some request is queued on it.
    refreshes: DashMap<String, Slot>,
}

impl<Exchange, C> TokenSupplier<Exchange, C>
where
    Exchange: RefreshGrant,
    C: Clock,
{
    pub fn new(exchange: Exchange, clock: C, timeout: StdDuration) -> Self {
        Self {
            exchange,
            clock,
            timeout,
            refreshes: DashMap::new(),
        }
    }

    pub async fn supply(&self, state: &CredentialState) -> Result<Supply, AuthError> {
        let now = self.clock.now();

        if let Some(access_token) = state.live_access_token(now) {
            debug!(message = "Using stored access token", token_expires_at = ?state.expires_at);
            return Ok(Supply {
                access_token: access_token.to_owned(),
                refreshed: None,
            });
        }

        let Some(refresh_token) = state.refresh_token.as_deref() else {
            debug!(message = "No refresh token in session");
            return Err(Unauthorized::NoRefreshToken.into());
        };

        info!(
            message = "No live access token, about to refresh",
            token_is_stale = state.access_token.is_some(),
        );

        let refreshed = self.refresh(refresh_token).await?;
        Ok(Supply {
            access_token: refreshed.access_token.clone(),
            refreshed: Some(refreshed),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Refreshed, AuthError> {
        let slot = Arc::clone(&self.refreshes.entry(refresh_token.to_owned()).or_default());
        let outcome = self.refresh_in(&slot, refresh_token).await;

        drop(slot);
        self.refreshes
            .remove_if(refresh_token, |_, slot| Arc::strong_count(slot) == 1);
        outcome
    }

    /// Refresh through `slot`, reusing what the request ahead in the queue got.
    async fn refresh_in(&self, slot: &Slot, refresh_token: &str) -> Result<Refreshed, AuthError> {
        let mut last = slot.lock().await;

        let now = self.clock.now();
        if let Some(previous) = (*last).as_ref().filter(|r| r.expires_at > now) {
            debug!(message = "Reusing concurrent refresh", token_expires_at = ?previous.expires_at);
            return Ok(Refreshed {
                lifetime: previous.expires_at - now,
                ..previous.clone()
            });
        }

        let grant = self.call_upstream(refresh_token).await?;
        let refreshed = Refreshed::from_grant(grant, self.clock.now()).map_err(|err| {
            error!(message = "Unusable token grant", error = %err);
            AuthError::from(err)
        })?;

        debug!(
            message = "Got new token",
            token_expires_at = ?refreshed.expires_at,
            refresh_token_rotated = refreshed.refresh_token.is_some(),
        );
        last.replace(refreshed.clone());
        Ok(refreshed)
    }

    async fn call_upstream(&self, refresh_token: &str) -> Result<Grant, AuthError> {
        let exchange = self.exchange.refresh(refresh_token);
        let err = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(grant)) => return Ok(grant),
            Ok(Err(err)) => err,
            Err(_) => {
                error!(message = "Credential exchange timed out", timeout = ?self.timeout);
                return Err(InternalError::Timeout(self.timeout).into());
            }
        };

        match err.rejected_status() {
            Some(status) => {
                let transient = ServerError {
                    status_code: status,
                }
                .is_transient();
                warn!(
                    message = "Authorization server refused the refresh",
                    status,
                    transient,
                );
                Err(Unauthorized::RefreshRejected { status }.into())
            }
            None => {
                error!(message = "Credential exchange failed", error = %err);
                Err(InternalError::Exchange(Box::new(err)).into())
            }
        }
    }
}
