mod index;
mod scripts;
mod status;

pub use index::*;
pub use scripts::*;
pub use status::*;

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::Response,
};
use url::Url;

/// Redirect to the configured repository.
///
/// Every outcome that does not produce a script download resolves here, so
/// the public surface never says why a file was unavailable.
pub fn repository_redirect(repository_url: &Url) -> Response {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, repository_url.as_str())
        .body(Body::empty())
        .expect("redirect response should always build")
}
