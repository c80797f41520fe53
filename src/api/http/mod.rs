pub mod axum;
pub mod cookies;
