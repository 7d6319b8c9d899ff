//! Embedded static pages
//!
//! The two HTML pages and the stylesheet are compiled into the binary, so
//! the deployed service is a single file with no asset directory to ship.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use rust_embed::RustEmbed;

#[derive(RustEmbed, Clone)]
#[folder = "web/"]
pub struct WebAssets;

/// Serves an embedded HTML page by name
pub fn page(name: &str) -> Response {
    match WebAssets::get(name) {
        Some(file) => Html(file.data.into_owned()).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
