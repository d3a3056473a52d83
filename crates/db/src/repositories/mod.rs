//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod attendance_repo;
pub mod member_repo;
pub mod schedule_repo;

pub use attendance_repo::AttendanceRepo;
pub use member_repo::MemberRepo;
pub use schedule_repo::ScheduleRepo;
