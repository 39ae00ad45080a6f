use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;
use tracing::warn;

/// Static UI files, addressed as `ui/<path>`.
#[derive(Embed)]
#[folder = "ui/"]
#[prefix = "ui/"]
struct StaticAssets;

pub const INDEX_PAGE: &str = "ui/index.html";
pub const HELLO_WORLD_PAGE: &str = "ui/pages/helloworld.html";

/// Serve an embedded file with a mime type guessed from its extension.
pub fn asset_response(path: &str) -> Response {
    match StaticAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime)],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => {
            warn!("static file not found: {path}");
            (StatusCode::NOT_FOUND, "404 page not found\n").into_response()
        }
    }
}
