use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use rhed::{
    api::http::{
        axum::{AppState, TokenRoute},
        cookies::CookiePolicy,
    },
    config::Config,
    core::SystemClock,
    spotify::auth::{refresh_token::RefreshTokenExchange, token_supplier::TokenSupplier},
};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let reqwest_client = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
        .context("building HTTP client")?;

    let exchange = RefreshTokenExchange {
        client: reqwest_client,
        client_id: config.client_id,
        client_secret: config.client_secret,
        token_url: config.token_url,
    };
    let supplier = TokenSupplier::new(exchange, SystemClock, config.upstream_timeout);

    let state = Arc::new(AppState {
        supplier,
        cookies: CookiePolicy {
            secure: config.environment.is_production(),
        },
    });

    let app = TokenRoute::routes(Router::new(), state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    info!(
        message = "Serving token endpoint",
        addr = %config.bind_addr,
        environment = ?config.environment,
    );

    axum::serve(listener, app).await?;
    Ok(())
}
