//! Handlers for `/gyms/{gym_id}/notifications`.
//!
//! One trigger endpoint covers welcome, individual expiry and bulk expiry
//! messages; a preview endpoint lists who a bulk run would reach.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use gymflow_core::attendance::local_date;
use gymflow_core::member::ExpiringMember;
use gymflow_core::templates::TemplateKind;
use gymflow_core::types::DbId;
use gymflow_core::{BatchResult, ChannelKind, ExpiryFinder, ExpiryWindow};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthOperator;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationRequest {
    /// `welcome`, `expiry` or `expiry_bulk`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Required for `welcome` and `expiry`.
    pub member_id: Option<DbId>,
    /// Bulk lookahead; defaults to the configured window.
    pub days_before: Option<u32>,
    /// `sms` or `whatsapp`; defaults to the configured channel.
    pub channel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    pub channel: ChannelKind,
    #[serde(flatten)]
    pub result: BatchResult,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days_before: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ExpiringResponse {
    pub window: ExpiryWindow,
    pub members: Vec<ExpiringMember>,
}

fn expiry_window(state: &AppState, days_before: Option<u32>) -> ExpiryWindow {
    let today = local_date(Utc::now(), state.config.workflow.utc_offset);
    ExpiryWindow::starting(
        today,
        days_before.unwrap_or(state.config.workflow.expiry_window_days),
    )
}

/// POST /api/v1/gyms/{gym_id}/notifications
///
/// Runs the dispatch and returns the tally. Single-member types report a
/// batch of one.
pub async fn send(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path(gym_id): Path<DbId>,
    Json(input): Json<NotificationRequest>,
) -> AppResult<Json<DataResponse<NotificationResponse>>> {
    auth.ensure_gym(gym_id)?;

    let kind: TemplateKind = input
        .kind
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("type is required".into()))?
        .parse()
        .map_err(|_| {
            AppError::BadRequest("type must be one of: welcome, expiry, expiry_bulk".into())
        })?;

    let channel = match input.channel.as_deref() {
        Some(raw) => raw.parse::<ChannelKind>().map_err(AppError::BadRequest)?,
        None => state.config.workflow.default_channel,
    };

    let member_id = match kind {
        TemplateKind::ExpiryBulk => None,
        TemplateKind::Welcome | TemplateKind::ExpiryIndividual => Some(input.member_id.ok_or_else(
            || AppError::BadRequest(format!("member_id is required for type '{kind}'")),
        )?),
    };
    let window = expiry_window(&state, input.days_before);

    let dispatcher = state.dispatcher();
    // Runs on the task tracker so a dropped connection cannot cut a batch
    // short. The route itself is exempt from the request timeout.
    let handle = state.tasks.spawn(async move {
        match (kind, member_id) {
            (TemplateKind::Welcome, Some(id)) => dispatcher.send_welcome(gym_id, id, channel).await,
            (TemplateKind::ExpiryIndividual, Some(id)) => {
                dispatcher.send_expiry_reminder(gym_id, id, channel).await
            }
            _ => dispatcher.send_bulk_expiry(gym_id, window, channel).await,
        }
    });

    let result = handle
        .await
        .map_err(|e| AppError::InternalError(format!("Dispatch task failed: {e}")))??;

    tracing::info!(
        gym_id,
        kind = %kind,
        %channel,
        total = result.total,
        successful = result.successful,
        failed = result.failed,
        "Notification request completed"
    );

    Ok(Json(DataResponse {
        data: NotificationResponse {
            kind,
            channel,
            result,
        },
    }))
}

/// GET /api/v1/gyms/{gym_id}/notifications/expiring?days_before=
///
/// Members a bulk run would message now, without sending anything.
pub async fn expiring(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path(gym_id): Path<DbId>,
    Query(params): Query<ExpiringQuery>,
) -> AppResult<Json<DataResponse<ExpiringResponse>>> {
    auth.ensure_gym(gym_id)?;

    let window = expiry_window(&state, params.days_before);
    let store = state.store();
    let members = ExpiryFinder::new(&store)
        .find_expiring(gym_id, window)
        .await?;

    Ok(Json(DataResponse {
        data: ExpiringResponse { window, members },
    }))
}
