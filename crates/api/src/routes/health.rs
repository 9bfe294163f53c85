//! `GET /health`, mounted at the root rather than under `/api/v1`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use gymflow_core::ChannelKind;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when the database answers and the default channel can send,
    /// `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Channels with credentials.
    pub channels: Vec<ChannelKind>,
    /// Channel used for welcomes and requests that name none.
    pub default_channel: ChannelKind,
    pub default_channel_ready: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = gymflow_db::health_check(&state.pool).await.is_ok();
    let default_channel = state.config.workflow.default_channel;
    let default_channel_ready = state.channels.is_configured(default_channel);

    Json(HealthResponse {
        status: if db_healthy && default_channel_ready {
            "ok"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        channels: state.channels.kinds(),
        default_channel,
        default_channel_ready,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
