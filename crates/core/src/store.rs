//! Remote store contracts consumed by the admin console workflows.
//!
//! The console never touches the database directly; it talks to these
//! traits. `steeple-client` implements them over HTTP, tests implement them
//! in memory.

use async_trait::async_trait;

use crate::attendance::{AttendanceEntry, AttendanceKey, AttendanceRow};
use crate::error::CoreError;
use crate::schedule::{ScheduleDefinition, ScheduleInput};
use crate::types::DbId;

/// A request that did not complete: a non-2xx answer or no answer at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status when the server answered, `None` for network failures.
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

/// Errors surfaced to the admin by the console workflows.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Rejected locally before any request was sent.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Request failed: {0}")]
    Transport(#[from] TransportError),

    /// A save is in flight; the action was not applied.
    #[error("A save is already in progress")]
    Busy,

    #[error("No move is awaiting confirmation")]
    NoPendingMove,

    #[error("Member {0} is not on the loaded roster")]
    UnknownMember(DbId),

    #[error("Schedule {0} is not on the board")]
    UnknownSchedule(DbId),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },
}

impl From<CoreError> for ConsoleError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ConsoleError::Validation(msg),
            CoreError::NotFound { entity, id } => ConsoleError::NotFound { entity, id },
        }
    }
}

/// Attendance endpoints. Every write answers with the full roster of the
/// occasion it wrote to.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn load_records(&self, key: AttendanceKey) -> Result<Vec<AttendanceRow>, TransportError>;

    async fn upsert_batch(
        &self,
        key: AttendanceKey,
        entries: &[AttendanceEntry],
    ) -> Result<Vec<AttendanceRow>, TransportError>;

    async fn move_batch(
        &self,
        from: AttendanceKey,
        to: AttendanceKey,
        entries: &[AttendanceEntry],
    ) -> Result<Vec<AttendanceRow>, TransportError>;
}

/// Schedule CRUD endpoints.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn list_schedules(&self) -> Result<Vec<ScheduleDefinition>, TransportError>;

    async fn create_schedule(
        &self,
        input: &ScheduleInput,
    ) -> Result<ScheduleDefinition, TransportError>;

    async fn update_schedule(
        &self,
        id: DbId,
        input: &ScheduleInput,
    ) -> Result<ScheduleDefinition, TransportError>;

    async fn delete_schedule(&self, id: DbId) -> Result<(), TransportError>;
}
