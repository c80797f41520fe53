//! Credential State as it lives in the browser's cookie jar.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tracing::debug;

use crate::{
    core::{expiry_from_millis, expiry_to_millis, CredentialState},
    spotify::auth::token_supplier::{Refreshed, REFRESH_TOKEN_LIFETIME},
};

pub const ACCESS_TOKEN: &str = "spotify_access_token";
pub const REFRESH_TOKEN: &str = "spotify_refresh_token";
pub const TOKEN_EXPIRY: &str = "spotify_token_expiry";

pub fn read_state(jar: &CookieJar) -> CredentialState {
    let value = |name: &str| {
        jar.get(name)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
    };

    let expires_at = value(TOKEN_EXPIRY).and_then(|raw| match expiry_from_millis(raw) {
        Ok(expires_at) => Some(expires_at),
        Err(err) => {
            debug!(message = "Ignoring expiry cookie", error = %err);
            None
        }
    });

    CredentialState {
        access_token: value(ACCESS_TOKEN).map(str::to_owned),
        refresh_token: value(REFRESH_TOKEN).map(str::to_owned),
        expires_at,
    }
}

/// Attributes shared by every credential cookie.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    /// Restrict the cookies to HTTPS.
    pub secure: bool,
}

impl CookiePolicy {
    /// Add the cookies that persist `refreshed` to the jar.
    pub fn persist(&self, jar: CookieJar, refreshed: &Refreshed) -> CookieJar {
        let jar = jar
            .add(self.cookie(
                ACCESS_TOKEN,
                refreshed.access_token.clone(),
                refreshed.lifetime,
            ))
            .add(self.cookie(
                TOKEN_EXPIRY,
                expiry_to_millis(refreshed.expires_at),
                refreshed.lifetime,
            ));

        match &refreshed.refresh_token {
            Some(refresh_token) => jar.add(self.cookie(
                REFRESH_TOKEN,
                refresh_token.clone(),
                REFRESH_TOKEN_LIFETIME,
            )),
            None => jar,
        }
    }

    fn cookie(&self, name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .build()
    }
}
