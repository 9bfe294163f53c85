use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gymflow_core::error::CoreError;
use gymflow_core::matcher::MatchError;
use gymflow_core::store::StoreError;
use gymflow_core::{AttendanceError, DispatchError};
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain error enums and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses of
/// the form `{ "error": ..., "code": ... }`, plus a `details` object where the
/// caller needs more to correct the input (e.g. the list of active members).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing, malformed or expired operator token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid token, wrong gym.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Status, machine-readable code, message and optional details.
type ErrorParts = (StatusCode, &'static str, String, Option<Value>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Attendance(err) => classify_attendance_error(err),
            AppError::Dispatch(err) => classify_dispatch_error(err),
            AppError::Match(err) => classify_match_error(err),
            AppError::Store(err) => classify_store_error(err),
            AppError::Database(err) => {
                let (status, code, message) = classify_sqlx_error(err);
                (status, code, message, None)
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None),
            AppError::InternalError(msg) => internal(msg),
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, axum::Json(body)).into_response()
    }
}

fn internal(msg: &str) -> ErrorParts {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
        None,
    )
}

fn classify_core_error(err: &CoreError) -> ErrorParts {
    match err {
        CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string(), None),
        CoreError::Validation(msg) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
        }
        CoreError::UnknownPlan(_) | CoreError::CustomPlanWithoutExpiry(_) => {
            (StatusCode::BAD_REQUEST, "UNKNOWN_PLAN", err.to_string(), None)
        }
        CoreError::ExpiryOutOfRange => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string(), None)
        }
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
    }
}

fn classify_attendance_error(err: &AttendanceError) -> ErrorParts {
    match err {
        AttendanceError::MemberNotFound(_) | AttendanceError::RecordNotFound(_) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string(), None)
        }
        AttendanceError::MemberInactive(_) => {
            (StatusCode::CONFLICT, "MEMBER_INACTIVE", err.to_string(), None)
        }
        AttendanceError::AlreadyCheckedIn {
            member_id,
            record_id,
        } => (
            StatusCode::CONFLICT,
            "ALREADY_CHECKED_IN",
            err.to_string(),
            Some(json!({ "member_id": member_id, "record_id": record_id })),
        ),
        AttendanceError::AlreadyCheckedOut(_) => (
            StatusCode::CONFLICT,
            "ALREADY_CHECKED_OUT",
            err.to_string(),
            None,
        ),
        AttendanceError::Match(e) => classify_match_error(e),
        AttendanceError::Store(e) => classify_store_error(e),
    }
}

fn classify_dispatch_error(err: &DispatchError) -> ErrorParts {
    match err {
        DispatchError::ChannelNotConfigured(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "CHANNEL_NOT_CONFIGURED",
            err.to_string(),
            None,
        ),
        DispatchError::MemberNotFound(_) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string(), None)
        }
        DispatchError::MemberInactive(_) => {
            (StatusCode::CONFLICT, "MEMBER_INACTIVE", err.to_string(), None)
        }
        DispatchError::Store(e) => classify_store_error(e),
    }
}

fn classify_match_error(err: &MatchError) -> ErrorParts {
    match err {
        MatchError::EmptyInput => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            err.to_string(),
            None,
        ),
        MatchError::NoMatchFound { active_members, .. } => (
            StatusCode::NOT_FOUND,
            "NO_MATCH",
            err.to_string(),
            Some(json!({ "active_members": active_members })),
        ),
        MatchError::AmbiguousMatch { candidates, .. } => (
            StatusCode::CONFLICT,
            "AMBIGUOUS_MATCH",
            err.to_string(),
            Some(json!({ "candidates": candidates })),
        ),
    }
}

fn classify_store_error(err: &StoreError) -> ErrorParts {
    match err {
        StoreError::Conflict(constraint) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
            None,
        ),
        StoreError::Decode { .. } | StoreError::Backend(_) => internal(&err.to_string()),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use gymflow_core::member::MemberBrief;
    use gymflow_core::ChannelKind;
    use http_body_util::BodyExt;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn no_match_lists_active_members() {
        let err = AppError::from(AttendanceError::Match(MatchError::NoMatchFound {
            input: "ghost".into(),
            active_members: vec![MemberBrief {
                id: 2,
                user_id: "GM0002".into(),
                name: "Jane Doe".into(),
            }],
        }));

        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NO_MATCH");
        assert_eq!(body["details"]["active_members"][0]["user_id"], "GM0002");
    }

    #[tokio::test]
    async fn missing_channel_is_service_unavailable() {
        let (status, body) =
            render(DispatchError::ChannelNotConfigured(ChannelKind::Whatsapp).into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "CHANNEL_NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn already_checked_in_reports_open_record() {
        let err = AttendanceError::AlreadyCheckedIn {
            member_id: 4,
            record_id: Some(17),
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ALREADY_CHECKED_IN");
        assert_eq!(body["details"]["record_id"], 17);
    }

    #[tokio::test]
    async fn decode_failures_are_sanitized() {
        let err = StoreError::Decode {
            entity: "member",
            message: "unknown status 'frozen'".into(),
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An internal error occurred");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn custom_plan_without_expiry_is_bad_request() {
        let err = CoreError::CustomPlanWithoutExpiry("Corporate".into());
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "UNKNOWN_PLAN");
        assert_eq!(
            body["error"],
            "Unknown plan 'Corporate'; supply expiry_date for custom plans"
        );
    }

    #[tokio::test]
    async fn missing_member_names_entity_and_id() {
        let err = CoreError::NotFound {
            entity: "Member",
            id: 9,
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Member with id 9 not found");
    }
}
