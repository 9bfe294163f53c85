//! Identifier and time aliases used across the workspace.

/// Primary key of every table (`BIGSERIAL`). Gym, member, attendance and
/// payment ids all share it.
pub type DbId = i64;

/// Check-in, check-out and ledger instants, always UTC. Calendar dates for
/// plans and "today" come from [`crate::attendance::local_date`].
pub type Timestamp = chrono::DateTime<chrono::Utc>;
