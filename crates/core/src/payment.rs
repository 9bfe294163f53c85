//! Payments and membership renewal.
//!
//! A payment renews the membership: the plan's months are added to the later
//! of the current expiry date and today, the member becomes active again and
//! the expiry reminder marker is cleared for the new cycle.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::member::Member;
use crate::plans::{find_plan, renewed_expiry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            other => Err(format!(
                "Invalid payment method '{other}'. Must be one of: cash, card, upi, bank_transfer"
            )),
        }
    }
}

/// Payment recorded at the front desk.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPayment {
    /// Whole currency units.
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: i64,
    pub method: PaymentMethod,
    /// Switch to this plan; defaults to the member's current plan.
    pub plan: Option<String>,
    /// Defaults to today.
    pub paid_on: Option<NaiveDate>,
}

/// Member fields a renewal writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Renewal {
    pub plan: String,
    pub paid_on: NaiveDate,
    pub plan_expiry_date: NaiveDate,
}

/// Work out the member's new plan and expiry date for `payment`.
pub fn plan_renewal(
    member: &Member,
    payment: &NewPayment,
    today: NaiveDate,
) -> Result<Renewal, CoreError> {
    let plan_name = payment
        .plan
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(&member.plan);

    let plan = find_plan(plan_name)
        .ok_or_else(|| CoreError::UnknownPlan(plan_name.to_string()))?;

    let paid_on = payment.paid_on.unwrap_or(today);
    let plan_expiry_date = renewed_expiry(member.plan_expiry_date, paid_on, plan)
        .ok_or(CoreError::ExpiryOutOfRange)?;

    Ok(Renewal {
        plan: plan.name.to_string(),
        paid_on,
        plan_expiry_date,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::member::fixtures::member;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payment(plan: Option<&str>) -> NewPayment {
        NewPayment {
            amount: 2999,
            method: PaymentMethod::Upi,
            plan: plan.map(str::to_string),
            paid_on: None,
        }
    }

    #[test]
    fn renewal_keeps_current_plan_by_default() {
        let mut m = member(1, 1, "GM0001", "Asha");
        m.plan_expiry_date = Some(date(2026, 10, 20));

        let renewal = plan_renewal(&m, &payment(None), date(2026, 10, 18)).unwrap();
        assert_eq!(renewal.plan, "Basic");
        assert_eq!(renewal.paid_on, date(2026, 10, 18));
        assert_eq!(renewal.plan_expiry_date, date(2026, 11, 20));
    }

    #[test]
    fn renewal_can_switch_plan() {
        let m = member(1, 1, "GM0001", "Asha");
        let renewal = plan_renewal(&m, &payment(Some("vip-3")), date(2026, 10, 18)).unwrap();
        assert_eq!(renewal.plan, "VIP-3");
        assert_eq!(renewal.plan_expiry_date, date(2027, 1, 18));
    }

    #[test]
    fn unknown_plan_is_rejected() {
        let m = member(1, 1, "GM0001", "Asha");
        assert_matches!(
            plan_renewal(&m, &payment(Some("Platinum")), date(2026, 10, 18)),
            Err(CoreError::UnknownPlan(plan)) if plan == "Platinum"
        );
    }

    #[test]
    fn non_positive_amount_fails_validation() {
        let mut p = payment(None);
        p.amount = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn method_parses() {
        assert_eq!(
            "bank_transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}
