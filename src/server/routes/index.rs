use crate::server::AppState;
use axum::{extract::State, response::Response};
use std::sync::Arc;

pub async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    super::repository_redirect(&state.settings.proxy_settings.repository_url)
}
