use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single expense entry.
///
/// `total` is `price * qty` as computed by the client; it is stored verbatim
/// and may carry `.` thousands separators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Outcome {
    pub id: i64,
    pub title: String,
    pub price: String,
    pub qty: f64,
    pub total: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new outcome row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOutcome {
    pub title: String,
    pub price: String,
    pub qty: f64,
    pub total: String,
}
