//! Gymflow domain logic.
//!
//! Pure types and the attendance and notification workflows, written
//! against the storage and messaging seams in [`store`], [`ledger`] and
//! [`channel`]. This crate performs no I/O of its own:
//!
//! - [`phone`]: free-form phone numbers to `+<country><number>`.
//! - [`matcher`]: front-desk identifier to one active member.
//! - [`tracker`]: check-in, check-out and the daily attendance view.
//! - [`expiry`]: members whose plan is about to expire.
//! - [`dispatch`]: templated reminders sent through a messaging channel.

pub mod attendance;
pub mod channel;
pub mod dispatch;
pub mod error;
pub mod expiry;
pub mod ledger;
pub mod matcher;
pub mod member;
pub mod payment;
pub mod phone;
pub mod plans;
pub mod settings;
pub mod store;
pub mod templates;
pub mod tracker;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use channel::{ChannelKind, ChannelRegistry, MessageChannel, SendError};
pub use dispatch::{BatchResult, DispatchError, NotificationDispatcher};
pub use error::CoreError;
pub use expiry::{ExpiryFinder, ExpiryWindow};
pub use settings::WorkflowSettings;
pub use tracker::{AttendanceError, AttendanceTracker};
