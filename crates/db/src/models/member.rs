//! Member entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use steeple_core::attendance::MemberRef;
use steeple_core::types::{DbId, Timestamp};

/// A row from the `members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Member {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Member {
    pub fn to_ref(&self) -> MemberRef {
        MemberRef {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// DTO for adding a member. The directory is maintained elsewhere; this is
/// used by seeding and tests.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMember {
    pub first_name: String,
    pub last_name: String,
}
