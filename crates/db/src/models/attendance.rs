//! Attendance row model.

use gymflow_core::attendance::AttendanceRecord;
use gymflow_core::store::StoreError;
use gymflow_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::parse_column;

/// A raw row from the `attendance` table.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceRow {
    pub id: DbId,
    pub gym_id: DbId,
    pub member_id: DbId,
    pub method: String,
    pub status: String,
    pub check_in_time: Timestamp,
    pub check_out_time: Option<Timestamp>,
    pub duration_minutes: Option<i64>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let record = AttendanceRecord {
            id: row.id,
            gym_id: row.gym_id,
            member_id: row.member_id,
            method: parse_column("attendance", &row.method)?,
            status: parse_column("attendance", &row.status)?,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            duration_minutes: row.duration_minutes,
        };

        if record.is_open() == record.check_out_time.is_some() {
            return Err(StoreError::Decode {
                entity: "attendance",
                message: format!(
                    "record {} has status '{}' but check_out_time {:?}",
                    record.id,
                    record.status.as_str(),
                    record.check_out_time
                ),
            });
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use gymflow_core::attendance::{AttendanceStatus, CheckInMethod};

    use super::*;

    fn row(method: &str, status: &str, checked_out: bool) -> AttendanceRow {
        let check_in = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        AttendanceRow {
            id: 1,
            gym_id: 1,
            member_id: 2,
            method: method.to_string(),
            status: status.to_string(),
            check_in_time: check_in,
            check_out_time: checked_out.then(|| Utc.with_ymd_and_hms(2026, 10, 18, 10, 30, 0).unwrap()),
            duration_minutes: checked_out.then_some(90),
        }
    }

    #[test]
    fn closed_row_decodes() {
        let record = AttendanceRecord::try_from(row("qr_scan", "checked_out", true)).unwrap();
        assert_eq!(record.method, CheckInMethod::QrScan);
        assert_eq!(record.status, AttendanceStatus::CheckedOut);
        assert_eq!(record.duration_minutes, Some(90));
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert_matches!(
            AttendanceRecord::try_from(row("nfc", "checked_in", false)),
            Err(StoreError::Decode { entity: "attendance", .. })
        );
    }

    #[test]
    fn inconsistent_checkout_is_rejected() {
        assert_matches!(
            AttendanceRecord::try_from(row("manual", "checked_in", true)),
            Err(StoreError::Decode { .. })
        );
    }
}
