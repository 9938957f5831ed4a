use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monthly snapshot of income and spending.
///
/// `type_invest` names the goal this month's savings go to. It is matched
/// against `Goal::title` when the dashboard is built and is never checked on
/// write, so a record can outlive its goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub bulan: String,              // month name
    pub tahun: i64,                 // year
    pub income: String,
    pub outcome: String,
    pub emergency_outcome: String,
    pub emergency_outcome_reason: String,
    pub type_invest: Option<String>,
    pub total: String,              // income - outcome - emergency_outcome
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new record row, amounts already in storage form.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub bulan: String,
    pub tahun: i64,
    pub income: String,
    pub outcome: String,
    pub emergency_outcome: String,
    pub emergency_outcome_reason: String,
    pub type_invest: Option<String>,
    pub total: String,
}
