//! Expiring-membership finder.
//!
//! Bulk mode returns active members whose plan ends within the lookahead
//! window and who have not been reminded for the current expiry cycle.
//! Individual mode fetches one member regardless of the reminder marker.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::member::{ExpiringMember, Member};
use crate::store::{MemberStore, StoreError};
use crate::types::DbId;

/// Default lookahead in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 5;

/// Inclusive date range `[start, end]` of plan expiry dates to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpiryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ExpiryWindow {
    /// `[today, today + days]`.
    pub fn starting(today: NaiveDate, days: u32) -> Self {
        let end = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        Self { start: today, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Whether `member` belongs in a bulk reminder run for `window`.
pub fn is_bulk_candidate(member: &Member, window: &ExpiryWindow) -> bool {
    member.is_active()
        && member
            .plan_expiry_date
            .is_some_and(|expiry| window.contains(expiry))
        && !member.is_notified_for_current_cycle()
}

/// Why an individual lookup produced no candidate.
#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    #[error("Member {0} not found")]
    MemberNotFound(DbId),

    #[error("Member {0} is not active")]
    MemberInactive(DbId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Query front-end over a [`MemberStore`].
pub struct ExpiryFinder<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: MemberStore + ?Sized> ExpiryFinder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Bulk mode: un-notified active members expiring inside `window`.
    ///
    /// Calling this twice without a successful send in between returns the
    /// same set.
    pub async fn find_expiring(
        &self,
        gym_id: DbId,
        window: ExpiryWindow,
    ) -> Result<Vec<ExpiringMember>, StoreError> {
        let members = self.store.list_expiring_members(gym_id, window).await?;
        tracing::debug!(
            gym_id,
            window_start = %window.start,
            window_end = %window.end,
            count = members.len(),
            "Expiring members found"
        );
        Ok(members)
    }

    /// Individual mode: one active member, ignoring the reminder marker.
    pub async fn find_individual(
        &self,
        gym_id: DbId,
        member_id: DbId,
    ) -> Result<ExpiringMember, FinderError> {
        let member = self
            .store
            .find_member(gym_id, member_id)
            .await?
            .ok_or(FinderError::MemberNotFound(member_id))?;

        if !member.is_active() {
            return Err(FinderError::MemberInactive(member_id));
        }

        Ok(ExpiringMember::from(&member))
    }
}
