use std::{convert::Infallible, marker::PhantomData, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use super::cookies::{self, CookiePolicy};
use crate::{
    core::Clock,
    spotify::auth::{
        token_supplier::{AuthError, Supply, TokenSupplier},
        RefreshGrant,
    },
};

pub struct AppState<Exchange, C> {
    pub supplier: TokenSupplier<Exchange, C>,
    pub cookies: CookiePolicy,
}

#[derive(Serialize)]
struct TokenBody {
    access_token: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AuthError::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, reason.to_string()),
            AuthError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process token request".to_owned(),
            ),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

pub struct TokenRoute<Exchange, C>(PhantomData<(Exchange, C)>, Infallible);

impl<Exchange, C> TokenRoute<Exchange, C>
where
    Exchange: RefreshGrant + 'static,
    C: Clock + 'static,
{
    async fn handler(
        State(state): State<Arc<AppState<Exchange, C>>>,
        jar: CookieJar,
    ) -> Result<(CookieJar, Json<TokenBody>), AuthError> {
        let session = cookies::read_state(&jar);
        let Supply {
            access_token,
            refreshed,
        } = state.supplier.supply(&session).await?;

        let jar = match &refreshed {
            Some(refreshed) => state.cookies.persist(jar, refreshed),
            None => jar,
        };
        Ok((jar, Json(TokenBody { access_token })))
    }

    pub fn routes(router: Router, state: Arc<AppState<Exchange, C>>) -> Router {
        router.merge(
            Router::new()
                .route("/api/spotify/token", get(Self::handler))
                .with_state(state),
        )
    }
}
