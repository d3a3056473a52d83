pub mod attendance;
pub mod member;
pub mod schedule;
