//! The derived dashboard view and the pure function that builds it.

pub mod aggregate;
pub mod amount;

pub use aggregate::{compute, rekap_invest, total_outcome};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::database::models::{Goal, Outcome, Record};

/// Everything the dashboard renders, recomputed from the three tables on
/// every read and after every mutation. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub goals: Vec<Goal>,
    pub outcomes: Vec<Outcome>,
    pub records: Vec<Record>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_outcome: Decimal,
    pub rekap_invest: Vec<RekapInvest>,
}

/// Accumulated savings for one goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RekapInvest {
    pub id: i64,
    pub type_invest: String,
    pub total_terkumpul: String,
    pub target: String,
}
