//! Domain core for the Steeple admin console.
//!
//! Holds the attendance and schedule vocabulary shared by the server and the
//! console client, the recurrence resolver, and the client-side workflows
//! (attendance reconciliation session, schedule board). This crate has no
//! internal dependencies so both `steeple-db` and `steeple-client` can use it.

pub mod attendance;
pub mod board;
pub mod error;
pub mod optimistic;
pub mod reconciliation;
pub mod recurrence;
pub mod schedule;
pub mod store;
pub mod types;
