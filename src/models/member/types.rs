use serde::{Deserialize, Serialize};

/// A person on the tracked roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: String,
    pub name: String,
}

/// Body of `POST /api/members`.
#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub name: String,
}
