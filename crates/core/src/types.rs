/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All audit timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Schedule date-times are wall-clock values with no timezone attached.
pub type LocalDateTime = chrono::NaiveDateTime;
