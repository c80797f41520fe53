use time::OffsetDateTime;

/// Credentials a browser session carries between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<OffsetDateTime>,
}

impl CredentialState {
    /// The stored access token, if it is still valid at `now`.
    pub fn live_access_token(&self, now: OffsetDateTime) -> Option<&str> {
        match (&self.access_token, self.expires_at) {
            (Some(access_token), Some(expires_at)) if expires_at > now => {
                Some(access_token.as_str())
            }
            _ => None,
        }
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unable to parse the expiry marker")]
pub struct ExpiryParsingError;

/// Parse an expiry marker stored as Unix milliseconds.
pub fn expiry_from_millis(value: &str) -> Result<OffsetDateTime, ExpiryParsingError> {
    let millis: i64 = value.trim().parse().map_err(|_| ExpiryParsingError)?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|_| ExpiryParsingError)
}

pub fn expiry_to_millis(expires_at: OffsetDateTime) -> String {
    (expires_at.unix_timestamp_nanos() / 1_000_000).to_string()
}
