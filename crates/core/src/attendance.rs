//! Attendance records, session duration and the daily aggregate view.
//!
//! Check-in and check-out are full UTC timestamps. Durations are whole
//! minutes between the two, so a session that crosses midnight is measured
//! correctly instead of wrapping around.

use std::fmt;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Lifecycle of an attendance record. `CheckedOut` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    CheckedIn,
    CheckedOut,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::CheckedIn => "checked_in",
            AttendanceStatus::CheckedOut => "checked_out",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checked_in" => Ok(AttendanceStatus::CheckedIn),
            "checked_out" => Ok(AttendanceStatus::CheckedOut),
            other => Err(format!("Invalid attendance status '{other}'")),
        }
    }
}

/// How the check-in was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInMethod {
    /// Entered by an operator at the front desk.
    Manual,
    /// Submitted from the public QR-code page.
    QrScan,
}

impl CheckInMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckInMethod::Manual => "manual",
            CheckInMethod::QrScan => "qr_scan",
        }
    }
}

impl fmt::Display for CheckInMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckInMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(CheckInMethod::Manual),
            "qr_scan" => Ok(CheckInMethod::QrScan),
            other => Err(format!("Invalid check-in method '{other}'")),
        }
    }
}

/// One gym visit by one member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub id: DbId,
    pub gym_id: DbId,
    pub member_id: DbId,
    pub method: CheckInMethod,
    pub status: AttendanceStatus,
    pub check_in_time: Timestamp,
    pub check_out_time: Option<Timestamp>,
    pub duration_minutes: Option<i64>,
}

impl AttendanceRecord {
    /// Whether the member is still inside (no check-out yet).
    pub fn is_open(&self) -> bool {
        self.status == AttendanceStatus::CheckedIn
    }
}

/// Insert payload for a check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckIn {
    pub gym_id: DbId,
    pub member_id: DbId,
    pub method: CheckInMethod,
    pub check_in_time: Timestamp,
}

/// Session length in whole minutes, clamped at zero.
///
/// Both timestamps are truncated to the minute before subtracting, so the
/// result equals `checkout_minutes - checkin_minutes`. A check-out earlier
/// than the check-in can only come from clock skew; it is logged and
/// reported as zero.
pub fn session_minutes(check_in: Timestamp, check_out: Timestamp) -> i64 {
    let raw = check_out.timestamp().div_euclid(60) - check_in.timestamp().div_euclid(60);
    if raw < 0 {
        tracing::warn!(
            %check_in,
            %check_out,
            raw_minutes = raw,
            "Check-out precedes check-in, clamping duration to zero"
        );
        return 0;
    }
    raw
}

/// `"{hours}h {minutes}m"`, e.g. `"1h 30m"`.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Calendar date of `ts` in the gym's local time.
pub fn local_date(ts: Timestamp, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// UTC bounds `[start, end)` of a local calendar day.
pub fn day_bounds(day: NaiveDate, offset: FixedOffset) -> (Timestamp, Timestamp) {
    let local_midnight = day.and_time(NaiveTime::MIN);
    let start = (local_midnight - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).and_utc();
    (start, start + TimeDelta::days(1))
}

/// Aggregate counters for one day of attendance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_check_ins: usize,
    pub currently_inside: usize,
    pub completed: usize,
    /// Mean over completed sessions; 0 when none completed.
    pub average_duration_minutes: f64,
}

/// Summarize the records whose check-in falls on `day` (gym local time).
pub fn summarize_day(records: &[AttendanceRecord], day: NaiveDate, offset: FixedOffset) -> DaySummary {
    let todays = records
        .iter()
        .filter(|r| local_date(r.check_in_time, offset) == day);

    let mut total_check_ins = 0;
    let mut currently_inside = 0;
    let mut completed = 0;
    let mut total_minutes = 0_i64;

    for record in todays {
        total_check_ins += 1;
        if record.is_open() {
            currently_inside += 1;
        } else {
            completed += 1;
            total_minutes += record.duration_minutes.unwrap_or(0);
        }
    }

    let average_duration_minutes = if completed == 0 {
        0.0
    } else {
        total_minutes as f64 / completed as f64
    };

    DaySummary {
        date: day,
        total_check_ins,
        currently_inside,
        completed,
        average_duration_minutes,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn open_record(id: DbId, member_id: DbId, check_in: Timestamp) -> AttendanceRecord {
        AttendanceRecord {
            id,
            gym_id: 1,
            member_id,
            method: CheckInMethod::Manual,
            status: AttendanceStatus::CheckedIn,
            check_in_time: check_in,
            check_out_time: None,
            duration_minutes: None,
        }
    }

    pub fn closed_record(
        id: DbId,
        member_id: DbId,
        check_in: Timestamp,
        check_out: Timestamp,
    ) -> AttendanceRecord {
        AttendanceRecord {
            status: AttendanceStatus::CheckedOut,
            check_out_time: Some(check_out),
            duration_minutes: Some(session_minutes(check_in, check_out)),
            ..open_record(id, member_id, check_in)
        }
    }
}
