use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Goal {
    pub id: i64,
    pub title: String,
    pub target: String, // decimal string as submitted, e.g. "5.000.000"
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
