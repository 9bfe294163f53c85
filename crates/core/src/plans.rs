//! Membership plan catalogue and expiry date arithmetic.

use chrono::{Months, NaiveDate};
use serde::Serialize;

/// A purchasable membership plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Plan identifier stored on the member (`"Premium-3"`).
    pub name: &'static str,
    /// Display tier (`"Premium"`).
    pub tier: &'static str,
    /// List price in whole rupees.
    pub price: i64,
    pub duration_months: u32,
}

const fn plan(name: &'static str, tier: &'static str, price: i64, duration_months: u32) -> Plan {
    Plan {
        name,
        tier,
        price,
        duration_months,
    }
}

/// All plans offered at the front desk.
pub const PLANS: &[Plan] = &[
    plan("Basic", "Basic", 2999, 1),
    plan("Premium", "Premium", 4999, 1),
    plan("VIP", "VIP", 7999, 1),
    plan("Basic-3", "Basic", 8500, 3),
    plan("Premium-3", "Premium", 14500, 3),
    plan("VIP-3", "VIP", 23000, 3),
    plan("Basic-6", "Basic", 16500, 6),
    plan("Premium-6", "Premium", 28500, 6),
    plan("VIP-6", "VIP", 45000, 6),
];

/// Look up a plan by name, ignoring ASCII case.
pub fn find_plan(name: &str) -> Option<&'static Plan> {
    let name = name.trim();
    PLANS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Expiry date of a plan started on `start`.
///
/// Month arithmetic clamps to the last day of shorter months
/// (Jan 31 + 1 month = Feb 28/29).
pub fn expiry_from(start: NaiveDate, plan: &Plan) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(plan.duration_months))
}

/// Expiry date after renewing on `today`.
///
/// Early renewals extend from the current expiry so no paid days are lost;
/// lapsed memberships restart from today.
pub fn renewed_expiry(
    current_expiry: Option<NaiveDate>,
    today: NaiveDate,
    plan: &Plan,
) -> Option<NaiveDate> {
    let base = match current_expiry {
        Some(expiry) if expiry > today => expiry,
        _ => today,
    };
    expiry_from(base, plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn catalogue_has_nine_plans() {
        assert_eq!(PLANS.len(), 9);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(find_plan("premium-3").unwrap().duration_months, 3);
        assert_eq!(find_plan(" VIP ").unwrap().price, 7999);
        assert!(find_plan("Platinum").is_none());
    }

    #[test]
    fn expiry_adds_duration_months() {
        let plan = find_plan("Basic-6").unwrap();
        assert_eq!(expiry_from(date(2026, 1, 15), plan), Some(date(2026, 7, 15)));
    }

    #[test]
    fn expiry_clamps_to_month_end() {
        let plan = find_plan("Basic").unwrap();
        assert_eq!(expiry_from(date(2026, 1, 31), plan), Some(date(2026, 2, 28)));
    }

    #[test]
    fn early_renewal_extends_current_expiry() {
        let plan = find_plan("Basic").unwrap();
        let renewed = renewed_expiry(Some(date(2026, 3, 10)), date(2026, 3, 5), plan);
        assert_eq!(renewed, Some(date(2026, 4, 10)));
    }

    #[test]
    fn lapsed_renewal_restarts_from_today() {
        let plan = find_plan("Basic").unwrap();
        let renewed = renewed_expiry(Some(date(2026, 1, 10)), date(2026, 3, 5), plan);
        assert_eq!(renewed, Some(date(2026, 4, 5)));
        assert_eq!(renewed_expiry(None, date(2026, 3, 5), plan), Some(date(2026, 4, 5)));
    }
}
