use serde::{Deserialize, Serialize};

/// Registered account, as exposed to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
}
