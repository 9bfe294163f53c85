//! Handlers for the `/gyms/{gym_id}/attendance` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use gymflow_core::attendance::{format_duration, AttendanceRecord, CheckInMethod};
use gymflow_core::member::MemberBrief;
use gymflow_core::tracker::TodayView;
use gymflow_core::types::DbId;
use gymflow_core::AttendanceTracker;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthOperator;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /attendance/check-in`. Exactly one of `member_id` or
/// `identifier` selects the member; `member_id` wins when both are sent.
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub member_id: Option<DbId>,
    /// Free-text name, member code or id, resolved by the matcher.
    pub identifier: Option<String>,
    /// Defaults to `manual`.
    pub method: Option<CheckInMethod>,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    /// Present when the member was resolved from an identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberBrief>,
    pub record: AttendanceRecord,
}

#[derive(Debug, Serialize)]
pub struct CheckOutResponse {
    pub record: AttendanceRecord,
    /// e.g. `"1h 30m"`.
    pub duration: String,
}

/// POST /api/v1/gyms/{gym_id}/attendance/check-in
pub async fn check_in(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path(gym_id): Path<DbId>,
    Json(input): Json<CheckInRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CheckInResponse>>)> {
    auth.ensure_gym(gym_id)?;

    let store = state.store();
    let tracker = AttendanceTracker::new(&store, state.config.workflow.utc_offset);
    let method = input.method.unwrap_or(CheckInMethod::Manual);
    let now = Utc::now();

    let response = match (input.member_id, input.identifier.as_deref()) {
        (Some(member_id), _) => CheckInResponse {
            member: None,
            record: tracker.check_in(gym_id, member_id, method, now).await?,
        },
        (None, Some(identifier)) => {
            let (member, record) = tracker
                .check_in_by_identifier(gym_id, identifier, method, now)
                .await?;
            CheckInResponse {
                member: Some(member.brief()),
                record,
            }
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "member_id or identifier is required".into(),
            ))
        }
    };

    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// POST /api/v1/gyms/{gym_id}/attendance/{record_id}/check-out
pub async fn check_out(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path((gym_id, record_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<CheckOutResponse>>> {
    auth.ensure_gym(gym_id)?;

    let store = state.store();
    let record = AttendanceTracker::new(&store, state.config.workflow.utc_offset)
        .check_out(gym_id, record_id, Utc::now())
        .await?;
    let duration = format_duration(record.duration_minutes.unwrap_or(0));

    Ok(Json(DataResponse {
        data: CheckOutResponse { record, duration },
    }))
}

/// GET /api/v1/gyms/{gym_id}/attendance/today
///
/// Today's check-ins in the gym's local day, split into members still inside
/// and completed sessions, with summary counts.
pub async fn today(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path(gym_id): Path<DbId>,
) -> AppResult<Json<DataResponse<TodayView>>> {
    auth.ensure_gym(gym_id)?;

    let store = state.store();
    let view = AttendanceTracker::new(&store, state.config.workflow.utc_offset)
        .today(gym_id, Utc::now())
        .await?;
    Ok(Json(DataResponse { data: view }))
}
