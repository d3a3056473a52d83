//! Row models and DTOs, one module per table.

pub mod attendance;
pub mod member;
pub mod schedule;
