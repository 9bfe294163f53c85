//! Member domain types.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::plans::{expiry_from, find_plan};
use crate::types::{DbId, Timestamp};

/// Prefix of the human-facing member code (`GM0001`, `GM0002`, ...).
pub const USER_ID_PREFIX: &str = "GM";

/// Membership lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
    Pending,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
            MemberStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MemberStatus::Active),
            "inactive" => Ok(MemberStatus::Inactive),
            "pending" => Ok(MemberStatus::Pending),
            other => Err(format!(
                "Invalid member status '{other}'. Must be one of: active, inactive, pending"
            )),
        }
    }
}

/// A gym member as seen by the workflows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub id: DbId,
    pub gym_id: DbId,
    /// Human-facing short code, assigned at creation.
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub whatsapp_number: Option<String>,
    pub plan: String,
    pub status: MemberStatus,
    pub join_date: NaiveDate,
    pub last_payment: Option<NaiveDate>,
    pub plan_expiry_date: Option<NaiveDate>,
    /// Expiry date the last bulk reminder was sent for.
    pub notified_expiry_date: Option<NaiveDate>,
    pub notified_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    /// Whether a bulk expiry reminder was already sent for the current expiry cycle.
    ///
    /// The marker is scoped to the expiry date it was set for, so a renewal
    /// that moves `plan_expiry_date` makes the member eligible again.
    pub fn is_notified_for_current_cycle(&self) -> bool {
        match (self.notified_expiry_date, self.plan_expiry_date) {
            (Some(notified), Some(expiry)) => notified == expiry,
            _ => false,
        }
    }

    pub fn brief(&self) -> MemberBrief {
        MemberBrief {
            id: self.id,
            user_id: self.user_id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Minimal member identity shown to operators for manual disambiguation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberBrief {
    pub id: DbId,
    pub user_id: String,
    pub name: String,
}

/// A member whose plan is about to expire, denormalized for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiringMember {
    pub member_id: DbId,
    pub gym_id: DbId,
    pub name: String,
    pub phone: String,
    pub whatsapp_number: Option<String>,
    pub plan: String,
    pub expiry_date: Option<NaiveDate>,
}

impl From<&Member> for ExpiringMember {
    fn from(member: &Member) -> Self {
        Self {
            member_id: member.id,
            gym_id: member.gym_id,
            name: member.name.clone(),
            phone: member.phone.clone(),
            whatsapp_number: member.whatsapp_number.clone(),
            plan: member.plan.clone(),
            expiry_date: member.plan_expiry_date,
        }
    }
}

/// Registration input for a new member.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMember {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    pub whatsapp_number: Option<String>,
    #[validate(length(min = 1, message = "plan is required"))]
    pub plan: String,
    pub join_date: Option<NaiveDate>,
    pub first_payment_date: Option<NaiveDate>,
    /// Overrides the catalogue-derived expiry date.
    pub expiry_date: Option<NaiveDate>,
}

impl NewMember {
    /// Trim surrounding whitespace from the free-text fields.
    pub fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.plan = self.plan.trim().to_string();
        self.whatsapp_number = self
            .whatsapp_number
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }
}

/// Fully resolved insert payload for a new member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub phone: String,
    pub whatsapp_number: Option<String>,
    pub plan: String,
    pub join_date: NaiveDate,
    pub last_payment: Option<NaiveDate>,
    pub plan_expiry_date: Option<NaiveDate>,
}

impl NewMember {
    /// Fill in defaults and derive the expiry date from the plan catalogue.
    ///
    /// `join_date` defaults to `today` and the first payment to the join
    /// date. A plan outside the catalogue is accepted only with an explicit
    /// `expiry_date`.
    pub fn into_registration(self, today: NaiveDate) -> Result<Registration, CoreError> {
        let input = self.trimmed();
        input.validate()?;

        let join_date = input.join_date.unwrap_or(today);
        let catalogue_plan = find_plan(&input.plan);

        let plan_expiry_date = match (input.expiry_date, catalogue_plan) {
            (Some(explicit), _) => explicit,
            (None, Some(plan)) => {
                expiry_from(join_date, plan).ok_or(CoreError::ExpiryOutOfRange)?
            }
            (None, None) => return Err(CoreError::CustomPlanWithoutExpiry(input.plan)),
        };

        Ok(Registration {
            plan: catalogue_plan.map_or(input.plan, |p| p.name.to_string()),
            name: input.name,
            phone: input.phone,
            whatsapp_number: input.whatsapp_number,
            join_date,
            last_payment: Some(input.first_payment_date.unwrap_or(join_date)),
            plan_expiry_date: Some(plan_expiry_date),
        })
    }
}

/// Format the gym-scoped member sequence number as a human-facing code.
///
/// ```
/// use gymflow_core::member::format_user_id;
///
/// assert_eq!(format_user_id(2), "GM0002");
/// assert_eq!(format_user_id(12345), "GM12345");
/// ```
pub fn format_user_id(sequence: i64) -> String {
    format!("{USER_ID_PREFIX}{sequence:04}")
}

/// Member values for tests here and in dependent crates.
#[cfg(any(test, feature = "testing"))]
pub mod fixtures {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;

    /// An active member with sensible defaults for tests.
    pub fn member(id: DbId, gym_id: DbId, user_id: &str, name: &str) -> Member {
        Member {
            id,
            gym_id,
            user_id: user_id.to_string(),
            name: name.to_string(),
            phone: "9876543210".to_string(),
            whatsapp_number: None,
            plan: "Basic".to_string(),
            status: MemberStatus::Active,
            join_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            last_payment: None,
            plan_expiry_date: None,
            notified_expiry_date: None,
            notified_at: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::member;
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            MemberStatus::Active,
            MemberStatus::Inactive,
            MemberStatus::Pending,
        ] {
            assert_eq!(status.as_str().parse::<MemberStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        let err = "suspended".parse::<MemberStatus>().unwrap_err();
        assert!(err.contains("Invalid member status"));
    }

    #[test]
    fn user_id_is_zero_padded() {
        assert_eq!(format_user_id(1), "GM0001");
        assert_eq!(format_user_id(999), "GM0999");
    }

    #[test]
    fn notified_marker_is_scoped_to_expiry_date() {
        let mut m = member(1, 1, "GM0001", "Asha");
        let expiry = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        m.plan_expiry_date = Some(expiry);
        assert!(!m.is_notified_for_current_cycle());

        m.notified_expiry_date = Some(expiry);
        assert!(m.is_notified_for_current_cycle());

        // Renewal moves the expiry date, so the old marker no longer applies.
        m.plan_expiry_date = Some(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert!(!m.is_notified_for_current_cycle());
    }

    #[test]
    fn new_member_validation_requires_fields() {
        let input = NewMember {
            name: String::new(),
            phone: "9876543210".to_string(),
            whatsapp_number: None,
            plan: "Basic".to_string(),
            join_date: None,
            first_payment_date: None,
            expiry_date: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    fn registration(plan: &str) -> NewMember {
        NewMember {
            name: "Jane Doe".to_string(),
            phone: "9876543210".to_string(),
            whatsapp_number: None,
            plan: plan.to_string(),
            join_date: None,
            first_payment_date: None,
            expiry_date: None,
        }
    }

    #[test]
    fn registration_derives_expiry_from_catalogue() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let reg = registration("premium-3").into_registration(today).unwrap();
        assert_eq!(reg.plan, "Premium-3");
        assert_eq!(reg.join_date, today);
        assert_eq!(reg.last_payment, Some(today));
        assert_eq!(reg.plan_expiry_date, NaiveDate::from_ymd_opt(2027, 1, 18));
    }

    #[test]
    fn custom_plan_needs_explicit_expiry() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let err = registration("Corporate").into_registration(today).unwrap_err();
        assert!(matches!(err, CoreError::CustomPlanWithoutExpiry(ref plan) if plan == "Corporate"));

        let mut custom = registration("Corporate");
        custom.expiry_date = NaiveDate::from_ymd_opt(2027, 10, 18);
        let reg = custom.into_registration(today).unwrap();
        assert_eq!(reg.plan, "Corporate");
        assert_eq!(reg.plan_expiry_date, NaiveDate::from_ymd_opt(2027, 10, 18));
    }

    #[test]
    fn trimmed_drops_blank_whatsapp_number() {
        let input = NewMember {
            name: "  Jane Doe ".to_string(),
            phone: " 98765 43210 ".to_string(),
            whatsapp_number: Some("   ".to_string()),
            plan: " Basic".to_string(),
            join_date: None,
            first_payment_date: None,
            expiry_date: None,
        }
        .trimmed();
        assert_eq!(input.name, "Jane Doe");
        assert_eq!(input.phone, "98765 43210");
        assert_eq!(input.plan, "Basic");
        assert!(input.whatsapp_number.is_none());
    }
}
