//! Route definitions for the gym-scoped operator resources.
//!
//! All endpoints require an operator token for the same gym.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{attendance, members, notifications, payments};
use crate::state::AppState;

/// Routes mounted at `/gyms/{gym_id}`.
///
/// ```text
/// POST   /members                               -> members::create
/// GET    /members                               -> members::list
/// GET    /members/lookup?q=                     -> members::lookup
/// GET    /members/{member_id}                   -> members::get_by_id
/// POST   /members/{member_id}/status            -> members::update_status
/// POST   /members/{member_id}/payments          -> payments::renew
/// GET    /members/{member_id}/payments          -> payments::list
///
/// POST   /attendance/check-in                   -> attendance::check_in
/// POST   /attendance/{record_id}/check-out      -> attendance::check_out
/// GET    /attendance/today                      -> attendance::today
///
/// GET    /notifications/expiring                -> notifications::expiring
/// ```
///
/// The dispatch trigger lives in [`dispatch_router`].
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/members", post(members::create).get(members::list))
        .route("/members/lookup", get(members::lookup))
        .route("/members/{member_id}", get(members::get_by_id))
        .route("/members/{member_id}/status", post(members::update_status))
        .route(
            "/members/{member_id}/payments",
            post(payments::renew).get(payments::list),
        )
        .route("/attendance/check-in", post(attendance::check_in))
        .route(
            "/attendance/{record_id}/check-out",
            post(attendance::check_out),
        )
        .route("/attendance/today", get(attendance::today))
        .route("/notifications/expiring", get(notifications::expiring))
}

/// Long-running routes mounted at `/gyms/{gym_id}`, exempt from the request
/// timeout.
///
/// ```text
/// POST   /notifications                         -> notifications::send
/// ```
pub fn dispatch_router() -> Router<AppState> {
    Router::new().route("/notifications", post(notifications::send))
}
