//! Refresh an access token using the refresh token grant.

use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, Secret};

use super::{ExchangeError, Grant};
use crate::spotify::utils::{check_status, ServerError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("server: {0}")]
    Server(#[from] ServerError),
    #[error("form encoding: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
}

impl ExchangeError for Error {
    fn rejected_status(&self) -> Option<u16> {
        match self {
            Error::Server(err) => Some(err.status_code),
            _ => None,
        }
    }
}

pub struct RefreshTokenExchange {
    pub client: reqwest::Client,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub token_url: String,
}

impl RefreshTokenExchange {
    /// Perform the refresh token grant.
    pub async fn perform(&self, refresh_token: &str) -> Result<Grant, Error> {
        let params = &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        let params = serde_urlencoded::to_string(params)?;

        let req = self
            .client
            .post(&self.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .body(params)
            .build()?;

        let res = self.client.execute(req).await?;
        check_status(&res)?;
        let grant = res.json().await?;
        Ok(grant)
    }
}

#[async_trait::async_trait]
impl super::RefreshGrant for RefreshTokenExchange {
    type Error = Error;

    async fn refresh(&self, refresh_token: &str) -> Result<Grant, Self::Error> {
        self.perform(refresh_token).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{body_string, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn exchange(server: &MockServer) -> RefreshTokenExchange {
        RefreshTokenExchange {
            client: reqwest::Client::new(),
            client_id: "client-id".into(),
            client_secret: Secret::new("client-secret".into()),
            token_url: format!("{}/api/token", server.uri()),
        }
    }

    #[tokio::test]
    async fn sends_basic_auth_and_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(header(
                "authorization",
                "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=",
            ))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("grant_type=refresh_token&refresh_token=rt1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at2",
                "token_type": "Bearer",
                "scope": "user-read-currently-playing",
                "expires_in": 3600,
                "refresh_token": "rt2",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = exchange(&server).perform("rt1").await.unwrap();
        assert_eq!(
            grant,
            Grant {
                access_token: "at2".into(),
                token_type: "Bearer".into(),
                scope: "user-read-currently-playing".into(),
                expires_in: 3600,
                refresh_token: Some("rt2".into()),
            }
        );
    }

    #[tokio::test]
    async fn refresh_token_is_optional_in_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at2",
                "token_type": "Bearer",
                "scope": "",
                "expires_in": 3600,
            })))
            .mount(&server)
            .await;

        let grant = exchange(&server).perform("rt1").await.unwrap();
        assert_eq!(grant.refresh_token, None);
    }

    #[tokio::test]
    async fn rejection_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid refresh token",
            })))
            .mount(&server)
            .await;

        let err = exchange(&server).perform("revoked").await.unwrap_err();
        assert_eq!(err.rejected_status(), Some(400));
    }

    #[tokio::test]
    async fn malformed_body_is_not_a_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = exchange(&server).perform("rt1").await.unwrap_err();
        assert!(matches!(err, Error::Reqwest(_)));
        assert_eq!(err.rejected_status(), None);
    }
}
