//! Spotify accounts service integration.

pub mod auth;
mod utils;

pub use utils::ServerError;

/// Token endpoint of the Spotify accounts service.
pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
