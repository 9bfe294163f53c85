//! Notification ledger: the "already reminded" marker on a member.
//!
//! Only a confirmed bulk expiry send sets the marker. Individual reminders
//! leave it alone so an operator can resend at will. The marker records the
//! expiry date it was set for; the renewal workflow moves the expiry date and
//! clears it, which starts a new cycle.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::store::StoreError;
use crate::types::{DbId, Timestamp};

#[async_trait]
pub trait NotificationLedger: Send + Sync {
    /// Record that the expiry reminder for `expiry_date` reached the member.
    ///
    /// Returns `false` if the member no longer exists in this gym.
    async fn mark_notified(
        &self,
        gym_id: DbId,
        member_id: DbId,
        expiry_date: NaiveDate,
        at: Timestamp,
    ) -> Result<bool, StoreError>;
}
