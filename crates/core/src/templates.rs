//! Message templates for member notifications.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Used when the gym lookup comes back empty.
pub const FALLBACK_GYM_NAME: &str = "Your Gym";

/// Day/month/year, the format members see in reminders.
pub const EXPIRY_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Sent once after registration.
    Welcome,
    /// Operator-triggered reminder for one member.
    ExpiryIndividual,
    /// Scheduled reminder sent to every expiring member.
    ExpiryBulk,
}

impl TemplateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKind::Welcome => "welcome",
            TemplateKind::ExpiryIndividual => "expiry_individual",
            TemplateKind::ExpiryBulk => "expiry_bulk",
        }
    }

    /// Whether a confirmed send of this kind sets the notified marker.
    pub fn marks_ledger(self) -> bool {
        matches!(self, TemplateKind::ExpiryBulk)
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "welcome" => Ok(TemplateKind::Welcome),
            "expiry" | "expiry_individual" => Ok(TemplateKind::ExpiryIndividual),
            "expiry_bulk" => Ok(TemplateKind::ExpiryBulk),
            other => Err(format!("Invalid template kind '{other}'")),
        }
    }
}

/// Values interpolated into a template.
#[derive(Debug, Clone)]
pub struct MessageContext<'a> {
    pub member_name: &'a str,
    pub plan: &'a str,
    pub gym_name: &'a str,
    pub expiry_date: Option<NaiveDate>,
}

/// `"dd/mm/yyyy"`, or `"soon"` when the member has no expiry date on file.
pub fn format_expiry_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format(EXPIRY_DATE_FORMAT).to_string(),
        None => "soon".to_string(),
    }
}

/// Render the message body for `kind`.
pub fn render(kind: TemplateKind, ctx: &MessageContext<'_>) -> String {
    let MessageContext {
        member_name: name,
        plan,
        gym_name: gym,
        expiry_date,
    } = ctx;

    match kind {
        TemplateKind::Welcome => format!(
            "🏋️ Welcome to {gym}, {name}!\n\n\
             Thank you for joining us! Your {plan} membership is now active.\n\n\
             We're excited to help you achieve your fitness goals. \
             If you have any questions, feel free to contact us.\n\n\
             Let's get started on your fitness journey! 💪"
        ),
        TemplateKind::ExpiryIndividual => {
            let date = format_expiry_date(*expiry_date);
            format!(
                "🏋️ Hi {name}!\n\n\
                 Your {plan} membership at {gym} expires on {date}.\n\n\
                 To continue enjoying our services, please renew your membership soon.\n\n\
                 Contact us for renewal or any questions!\n\n\
                 Thank you for being a valued member! 💪"
            )
        }
        TemplateKind::ExpiryBulk => {
            let date = format_expiry_date(*expiry_date);
            format!(
                "🏋️ Hi {name}!\n\n\
                 Your {plan} membership at {gym} is expiring on {date}.\n\n\
                 To continue enjoying our services, please renew your membership soon.\n\n\
                 Contact us for renewal or any questions!\n\n\
                 Thank you for being a valued member! 💪"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(expiry_date: Option<NaiveDate>) -> MessageContext<'static> {
        MessageContext {
            member_name: "Jane Doe",
            plan: "Premium",
            gym_name: "Iron Temple",
            expiry_date,
        }
    }

    #[test]
    fn welcome_mentions_gym_member_and_plan() {
        let body = render(TemplateKind::Welcome, &ctx(None));
        assert!(body.starts_with("🏋️ Welcome to Iron Temple, Jane Doe!"));
        assert!(body.contains("Your Premium membership is now active."));
        assert!(body.contains("We're excited to help you achieve your fitness goals. If you"));
    }

    #[test]
    fn expiry_templates_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5);
        let individual = render(TemplateKind::ExpiryIndividual, &ctx(date));
        let bulk = render(TemplateKind::ExpiryBulk, &ctx(date));

        assert!(individual.contains("Your Premium membership at Iron Temple expires on 05/03/2026."));
        assert!(bulk.contains("Your Premium membership at Iron Temple is expiring on 05/03/2026."));
    }

    #[test]
    fn missing_expiry_date_reads_soon() {
        let body = render(TemplateKind::ExpiryIndividual, &ctx(None));
        assert!(body.contains("expires on soon."));
    }

    #[test]
    fn only_bulk_marks_ledger() {
        assert!(TemplateKind::ExpiryBulk.marks_ledger());
        assert!(!TemplateKind::ExpiryIndividual.marks_ledger());
        assert!(!TemplateKind::Welcome.marks_ledger());
    }

    #[test]
    fn kind_parses() {
        assert_eq!(
            "expiry_bulk".parse::<TemplateKind>().unwrap(),
            TemplateKind::ExpiryBulk
        );
        assert_eq!(
            "expiry".parse::<TemplateKind>().unwrap(),
            TemplateKind::ExpiryIndividual
        );
        assert!("birthday".parse::<TemplateKind>().is_err());
    }
}
