//! Handlers for the `/gyms/{gym_id}/members` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use gymflow_core::attendance::local_date;
use gymflow_core::error::CoreError;
use gymflow_core::matcher::match_member;
use gymflow_core::member::{Member, MemberStatus, NewMember};
use gymflow_core::store::MemberStore;
use gymflow_core::types::DbId;
use gymflow_db::repositories::MemberRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthOperator;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /members`.
#[derive(Debug, Deserialize)]
pub struct ListMembersQuery {
    /// `active`, `inactive` or `pending`. All members when absent.
    pub status: Option<String>,
}

/// Body of `POST /members/{member_id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    /// `active`, `inactive` or `pending`.
    pub status: String,
}

/// Query parameters for `GET /members/lookup`.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub q: String,
}

/// POST /api/v1/gyms/{gym_id}/members
///
/// Registers a member and, when the default channel is configured, sends a
/// welcome message in the background. A failed welcome is logged only.
pub async fn create(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path(gym_id): Path<DbId>,
    Json(input): Json<NewMember>,
) -> AppResult<(StatusCode, Json<DataResponse<Member>>)> {
    auth.ensure_gym(gym_id)?;

    let today = local_date(Utc::now(), state.config.workflow.utc_offset);
    let registration = input.into_registration(today)?;

    let row = MemberRepo::create(&state.pool, gym_id, &registration).await?;
    let member = Member::try_from(row)?;

    tracing::info!(
        gym_id,
        member_id = member.id,
        user_id = %member.user_id,
        plan = %member.plan,
        "Member registered"
    );

    spawn_welcome(&state, gym_id, member.id);

    Ok((StatusCode::CREATED, Json(DataResponse { data: member })))
}

fn spawn_welcome(state: &AppState, gym_id: DbId, member_id: DbId) {
    let channel = state.config.workflow.default_channel;
    if !state.channels.is_configured(channel) {
        tracing::debug!(gym_id, member_id, %channel, "No channel configured, skipping welcome");
        return;
    }

    let dispatcher = state.dispatcher();
    state.tasks.spawn(async move {
        match dispatcher.send_welcome(gym_id, member_id, channel).await {
            Ok(result) if result.failed == 0 => {
                tracing::info!(gym_id, member_id, %channel, "Welcome message sent");
            }
            Ok(result) => {
                tracing::warn!(gym_id, member_id, errors = ?result.errors, "Welcome message failed");
            }
            Err(e) => {
                tracing::warn!(gym_id, member_id, error = %e, "Welcome message not dispatched");
            }
        }
    });
}

/// GET /api/v1/gyms/{gym_id}/members?status=
pub async fn list(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path(gym_id): Path<DbId>,
    Query(params): Query<ListMembersQuery>,
) -> AppResult<Json<DataResponse<Vec<Member>>>> {
    auth.ensure_gym(gym_id)?;

    let status = params
        .status
        .as_deref()
        .map(str::parse::<MemberStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let members = state.store().list_members(gym_id, status).await?;
    Ok(Json(DataResponse { data: members }))
}

/// GET /api/v1/gyms/{gym_id}/members/{member_id}
pub async fn get_by_id(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path((gym_id, member_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Member>>> {
    auth.ensure_gym(gym_id)?;

    let member = state
        .store()
        .find_member(gym_id, member_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Member",
            id: member_id,
        }))?;
    Ok(Json(DataResponse { data: member }))
}

/// POST /api/v1/gyms/{gym_id}/members/{member_id}/status
///
/// Only active members can check in or receive reminders, so deactivating a
/// member takes them out of both.
pub async fn update_status(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path((gym_id, member_id)): Path<(DbId, DbId)>,
    Json(input): Json<StatusChange>,
) -> AppResult<Json<DataResponse<Member>>> {
    auth.ensure_gym(gym_id)?;

    let status: MemberStatus = input.status.parse().map_err(AppError::BadRequest)?;
    let row = MemberRepo::update_status(&state.pool, gym_id, member_id, status)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Member",
            id: member_id,
        }))?;
    let member = Member::try_from(row)?;

    tracing::info!(gym_id, member_id, %status, "Member status changed");
    Ok(Json(DataResponse { data: member }))
}

/// GET /api/v1/gyms/{gym_id}/members/lookup?q=
///
/// Resolves a front-desk identifier (name, member code or id) to one active
/// member. On no match the error lists the active members.
pub async fn lookup(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path(gym_id): Path<DbId>,
    Query(params): Query<LookupQuery>,
) -> AppResult<Json<DataResponse<Member>>> {
    auth.ensure_gym(gym_id)?;

    let active = state
        .store()
        .list_members(gym_id, Some(MemberStatus::Active))
        .await?;
    let member = match_member(&params.q, &active)?.clone();
    Ok(Json(DataResponse { data: member }))
}
