//! Repository layer: one zero-sized struct per table.

pub mod attendance_repo;
pub mod gym_repo;
pub mod member_repo;
pub mod payment_repo;

pub use attendance_repo::AttendanceRepo;
pub use gym_repo::GymRepo;
pub use member_repo::MemberRepo;
pub use payment_repo::PaymentRepo;
