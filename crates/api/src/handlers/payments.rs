//! Handlers for `/gyms/{gym_id}/members/{member_id}/payments`.
//!
//! Recording a payment renews the membership.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use gymflow_core::attendance::local_date;
use gymflow_core::error::CoreError;
use gymflow_core::member::Member;
use gymflow_core::payment::{plan_renewal, NewPayment};
use gymflow_core::store::MemberStore;
use gymflow_core::types::DbId;
use gymflow_db::models::payment::Payment;
use gymflow_db::repositories::PaymentRepo;
use serde::Serialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthOperator;
use crate::response::DataResponse;
use crate::state::AppState;

/// A recorded payment together with the renewed member.
#[derive(Debug, Serialize)]
pub struct RenewalResponse {
    pub payment: Payment,
    pub member: Member,
}

/// POST /api/v1/gyms/{gym_id}/members/{member_id}/payments
pub async fn renew(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path((gym_id, member_id)): Path<(DbId, DbId)>,
    Json(input): Json<NewPayment>,
) -> AppResult<(StatusCode, Json<DataResponse<RenewalResponse>>)> {
    auth.ensure_gym(gym_id)?;
    input.validate().map_err(CoreError::from)?;

    let member = state
        .store()
        .find_member(gym_id, member_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Member",
            id: member_id,
        }))?;

    let today = local_date(Utc::now(), state.config.workflow.utc_offset);
    let renewal = plan_renewal(&member, &input, today)?;

    let (payment, row) =
        PaymentRepo::record_renewal(&state.pool, gym_id, member_id, &input, &renewal).await?;
    let member = Member::try_from(row)?;

    tracing::info!(
        gym_id,
        member_id,
        payment_id = payment.id,
        plan = %renewal.plan,
        expiry = %renewal.plan_expiry_date,
        "Membership renewed"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: RenewalResponse { payment, member },
        }),
    ))
}

/// GET /api/v1/gyms/{gym_id}/members/{member_id}/payments
pub async fn list(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path((gym_id, member_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Vec<Payment>>>> {
    auth.ensure_gym(gym_id)?;

    let payments = PaymentRepo::list_for_member(&state.pool, gym_id, member_id).await?;
    Ok(Json(DataResponse { data: payments }))
}
