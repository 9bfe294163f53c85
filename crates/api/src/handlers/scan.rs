//! Public QR check-in.
//!
//! The QR code at the gym entrance encodes the gym id; the member types or
//! scans their member code. No operator token is required, so responses
//! never list other members.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use gymflow_core::attendance::{AttendanceRecord, CheckInMethod};
use gymflow_core::error::CoreError;
use gymflow_core::matcher::MatchError;
use gymflow_core::member::MemberBrief;
use gymflow_core::types::DbId;
use gymflow_core::{AttendanceError, AttendanceTracker};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScanCheckInRequest {
    pub gym_id: DbId,
    pub member_identifier: String,
}

#[derive(Debug, Serialize)]
pub struct ScanCheckInResponse {
    pub member: MemberBrief,
    pub record: AttendanceRecord,
}

/// POST /api/v1/scan/check-in
pub async fn check_in(
    State(state): State<AppState>,
    Json(input): Json<ScanCheckInRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ScanCheckInResponse>>)> {
    let store = state.store();
    let (member, record) = AttendanceTracker::new(&store, state.config.workflow.utc_offset)
        .check_in_by_identifier(
            input.gym_id,
            &input.member_identifier,
            CheckInMethod::QrScan,
            Utc::now(),
        )
        .await
        .map_err(redact)?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ScanCheckInResponse {
                member: member.brief(),
                record,
            },
        }),
    ))
}

/// Drop member listings from matcher errors before they leave the service.
fn redact(err: AttendanceError) -> AppError {
    match err {
        AttendanceError::Match(MatchError::NoMatchFound { input, .. }) => {
            AppError::Match(MatchError::NoMatchFound {
                input,
                active_members: Vec::new(),
            })
        }
        AttendanceError::Match(MatchError::AmbiguousMatch { input, .. }) => {
            AppError::Core(CoreError::Conflict(format!(
                "'{input}' matches more than one member; use your member code"
            )))
        }
        other => other.into(),
    }
}
