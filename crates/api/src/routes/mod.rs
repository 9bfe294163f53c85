pub mod gyms;
pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers::scan;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /scan/check-in                       public QR check-in (POST)
///
/// /gyms/{gym_id}/members               register, list
/// /gyms/{gym_id}/members/lookup        resolve identifier
/// /gyms/{gym_id}/members/{id}          get
/// /gyms/{gym_id}/members/{id}/status   activate, deactivate
/// /gyms/{gym_id}/members/{id}/payments renew, history
/// /gyms/{gym_id}/attendance/...        check-in, check-out, today
/// /gyms/{gym_id}/notifications/expiring  preview
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/scan/check-in", post(scan::check_in))
        .nest("/gyms/{gym_id}", gyms::router())
}

/// Build the `/api/v1` routes that run without a request timeout.
///
/// ```text
/// /gyms/{gym_id}/notifications         trigger a dispatch run
/// ```
pub fn dispatch_routes() -> Router<AppState> {
    Router::new().nest("/gyms/{gym_id}", gyms::dispatch_router())
}
