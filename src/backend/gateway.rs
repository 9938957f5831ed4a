//! Create/delete operations for goals, records and outcomes.
//!
//! Every successful mutation is followed by a full recompute of the dashboard
//! from the three tables and a publication on the broadcast channel. There is
//! no transaction spanning the write and the publication: if reloading the
//! view fails after the write committed, the caller gets a `Store` error and
//! subscribers catch up on the next successful mutation or full read.
//!
//! Recompute and publish run under one lock, so publications go out in the
//! order their snapshots were taken and the latest one reflects the store.

use std::sync::Arc;

use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::backend::broadcast::BroadcastChannel;
use crate::dashboard::amount::AmountInput;
use crate::dashboard::{self, DashboardView};
use crate::database::db::queries;
use crate::database::models::{Goal, NewOutcome, NewRecord, Outcome, Record};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Result of a mutation: the touched entity and the view published for it.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    pub entity: T,
    pub view: DashboardView,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGoal {
    pub title: Option<String>,
    pub target: Option<AmountInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRecord {
    pub bulan: Option<String>,
    pub tahun: Option<AmountInput>,
    pub income: Option<AmountInput>,
    pub outcome: Option<AmountInput>,
    pub emergency_outcome: Option<AmountInput>,
    pub emergency_outcome_reason: Option<String>,
    pub type_invest: Option<String>,
    pub total: Option<AmountInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOutcome {
    pub title: Option<String>,
    pub price: Option<AmountInput>,
    pub quantity: Option<AmountInput>,
    pub total: Option<AmountInput>,
}

#[derive(Clone)]
pub struct Gateway {
    db: Pool<Sqlite>,
    channel: BroadcastChannel,
    publish_lock: Arc<Mutex<()>>,
}

impl Gateway {
    pub fn new(db: Pool<Sqlite>, channel: BroadcastChannel) -> Self {
        Self {
            db,
            channel,
            publish_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn channel(&self) -> &BroadcastChannel {
        &self.channel
    }

    /// Current dashboard, built from full table reads.
    pub async fn snapshot(&self) -> Result<DashboardView, GatewayError> {
        let (goals, outcomes, records) = tokio::try_join!(
            queries::list_goals(&self.db),
            queries::list_outcomes(&self.db),
            queries::list_records(&self.db),
        )?;
        Ok(dashboard::compute(goals, outcomes, records))
    }

    /// Publishes the current view once so the first subscribers get a
    /// snapshot before any mutation happens.
    pub async fn prime(&self) -> Result<DashboardView, GatewayError> {
        let _publishing = self.publish_lock.lock().await;
        let view = self.snapshot().await?;
        self.channel.publish(view.clone());
        Ok(view)
    }

    pub async fn list_goals(&self) -> Result<Vec<Goal>, GatewayError> {
        Ok(queries::list_goals(&self.db).await?)
    }

    pub async fn list_records(&self) -> Result<Vec<Record>, GatewayError> {
        Ok(queries::list_records(&self.db).await?)
    }

    pub async fn list_outcomes(&self) -> Result<Vec<Outcome>, GatewayError> {
        Ok(queries::list_outcomes(&self.db).await?)
    }

    pub async fn create_goal(&self, req: CreateGoal) -> Result<Mutation<Goal>, GatewayError> {
        let title = required_text(req.title);
        let target = required_nonzero(req.target).map(AmountInput::into_storage);
        let (Some(title), Some(target)) = (title, target) else {
            return Err(GatewayError::Validation(
                "title and target are required".into(),
            ));
        };

        let goal = queries::create_goal(&self.db, &title, &target).await?;
        info!(goal_id = goal.id, title = %goal.title, "goal created");
        self.settle(goal).await
    }

    pub async fn delete_goal(&self, id: &str) -> Result<Mutation<Goal>, GatewayError> {
        let goal = match parse_id(id) {
            Some(id) => queries::delete_goal(&self.db, id).await?,
            None => None,
        }
        .ok_or_else(|| GatewayError::NotFound("goal not found".into()))?;

        info!(goal_id = goal.id, title = %goal.title, "goal deleted");
        self.settle(goal).await
    }

    pub async fn create_record(&self, req: CreateRecord) -> Result<Mutation<Record>, GatewayError> {
        let bulan = required_text(req.bulan);
        let tahun = required_nonzero(req.tahun);
        let (Some(bulan), Some(tahun)) = (bulan, tahun) else {
            return Err(GatewayError::Validation(
                "bulan and tahun are required".into(),
            ));
        };
        let tahun = tahun
            .to_i64()
            .ok_or_else(|| GatewayError::Validation("tahun must be a year number".into()))?;

        let new = NewRecord {
            bulan,
            tahun,
            income: amount_or_zero(req.income),
            outcome: amount_or_zero(req.outcome),
            emergency_outcome: amount_or_zero(req.emergency_outcome),
            emergency_outcome_reason: req.emergency_outcome_reason.unwrap_or_default(),
            type_invest: req.type_invest.filter(|t| !t.is_empty()),
            total: amount_or_zero(req.total),
        };

        let record = queries::create_record(&self.db, &new).await?;
        info!(
            record_id = record.id,
            bulan = %record.bulan,
            tahun = record.tahun,
            "record created"
        );
        self.settle(record).await
    }

    pub async fn delete_record(&self, id: &str) -> Result<Mutation<Record>, GatewayError> {
        let record = match parse_id(id) {
            Some(id) => queries::delete_record(&self.db, id).await?,
            None => None,
        }
        .ok_or_else(|| GatewayError::NotFound("record not found".into()))?;

        info!(record_id = record.id, "record deleted");
        self.settle(record).await
    }

    pub async fn create_outcome(&self, req: CreateOutcome) -> Result<Mutation<Outcome>, GatewayError> {
        let title = required_text(req.title);
        let price = required_amount(req.price);
        let total = required_amount(req.total);
        // Zero is a real quantity; only an absent one is rejected.
        let (Some(title), Some(price), Some(quantity), Some(total)) =
            (title, price, req.quantity, total)
        else {
            return Err(GatewayError::Validation(
                "title, price, quantity and total are required".into(),
            ));
        };
        let qty = quantity
            .to_f64()
            .ok_or_else(|| GatewayError::Validation("quantity must be a number".into()))?;

        let new = NewOutcome {
            title,
            price,
            qty,
            total,
        };
        let outcome = queries::create_outcome(&self.db, &new).await?;
        info!(outcome_id = outcome.id, title = %outcome.title, "outcome created");
        self.settle(outcome).await
    }

    pub async fn delete_outcome(&self, id: &str) -> Result<Mutation<Outcome>, GatewayError> {
        let outcome = match parse_id(id) {
            Some(id) => queries::delete_outcome(&self.db, id).await?,
            None => None,
        }
        .ok_or_else(|| GatewayError::NotFound("outcome not found".into()))?;

        info!(outcome_id = outcome.id, "outcome deleted");
        self.settle(outcome).await
    }

    async fn settle<T>(&self, entity: T) -> Result<Mutation<T>, GatewayError> {
        let _publishing = self.publish_lock.lock().await;
        let view = match self.snapshot().await {
            Ok(view) => view,
            Err(e) => {
                error!(error = %e, "write committed but dashboard recompute failed; update not broadcast");
                return Err(e);
            }
        };
        self.channel.publish(view.clone());
        Ok(Mutation { entity, view })
    }
}

fn required_text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn required_amount(value: Option<AmountInput>) -> Option<String> {
    value.filter(|a| !a.is_blank()).map(AmountInput::into_storage)
}

// Required fields where a bare `0` means "not given".
fn required_nonzero(value: Option<AmountInput>) -> Option<AmountInput> {
    value.filter(|a| !a.is_blank() && !a.is_zero_number())
}

fn amount_or_zero(value: Option<AmountInput>) -> String {
    required_amount(value).unwrap_or_else(|| "0".to_string())
}

// Ids are opaque to callers; anything that is not one of ours simply does not exist.
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::{connection, migrate};

    async fn gateway() -> Gateway {
        let pool = connection::memory_pool().await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        Gateway::new(pool, BroadcastChannel::new(16))
    }

    fn goal_req(title: &str, target: &str) -> CreateGoal {
        CreateGoal {
            title: Some(title.into()),
            target: Some(target.into()),
        }
    }

    fn record_req(type_invest: &str, total: i64) -> CreateRecord {
        CreateRecord {
            bulan: Some("Januari".into()),
            tahun: Some(2025_i64.into()),
            income: Some(total.into()),
            outcome: Some(0_i64.into()),
            type_invest: Some(type_invest.into()),
            total: Some(total.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_goal_requires_title_and_target() {
        let gw = gateway().await;
        for req in [
            CreateGoal::default(),
            CreateGoal {
                title: Some("Laptop".into()),
                target: None,
            },
            goal_req("  ", "100"),
            goal_req("Laptop", ""),
        ] {
            let err = gw.create_goal(req).await.unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)), "{err:?}");
        }
        assert!(gw.list_goals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn goal_and_record_roll_up_into_rekap() {
        let gw = gateway().await;
        let goal = gw
            .create_goal(goal_req("Emergency Fund", "5.000.000"))
            .await
            .unwrap()
            .entity;
        let created = gw
            .create_record(record_req("Emergency Fund", 200000))
            .await
            .unwrap();

        assert_eq!(created.entity.total, "200000");
        let rekap = &created.view.rekap_invest;
        assert_eq!(rekap.len(), 1);
        assert_eq!(rekap[0].id, goal.id);
        assert_eq!(rekap[0].type_invest, "Emergency Fund");
        assert_eq!(rekap[0].total_terkumpul, "200000");
        assert_eq!(rekap[0].target, "5.000.000");
    }

    #[tokio::test]
    async fn deleting_a_goal_orphans_its_records() {
        let gw = gateway().await;
        let goal = gw.create_goal(goal_req("Laptop", "10")).await.unwrap().entity;
        gw.create_record(record_req("Laptop", 5)).await.unwrap();

        let deleted = gw.delete_goal(&goal.id.to_string()).await.unwrap();
        assert_eq!(deleted.entity, goal);
        assert!(deleted.view.rekap_invest.is_empty());
        assert_eq!(deleted.view.records.len(), 1);
        assert_eq!(deleted.view.records[0].type_invest.as_deref(), Some("Laptop"));
    }

    #[tokio::test]
    async fn record_defaults_and_coercion() {
        let gw = gateway().await;
        let req = CreateRecord {
            bulan: Some("Februari".into()),
            tahun: Some("2024".into()),
            income: Some("7000000".into()),
            outcome: Some(2_500_000_i64.into()),
            total: Some("4500000".into()),
            ..Default::default()
        };
        let record = gw.create_record(req).await.unwrap().entity;

        assert_eq!(record.tahun, 2024);
        assert_eq!(record.outcome, "2500000");
        assert_eq!(record.emergency_outcome, "0");
        assert_eq!(record.emergency_outcome_reason, "");
        assert_eq!(record.type_invest, None);
    }

    #[tokio::test]
    async fn record_requires_month_and_numeric_year() {
        let gw = gateway().await;
        let missing = CreateRecord {
            tahun: Some(2025_i64.into()),
            ..Default::default()
        };
        assert!(matches!(
            gw.create_record(missing).await,
            Err(GatewayError::Validation(_))
        ));

        let bad_year = CreateRecord {
            bulan: Some("Mei".into()),
            tahun: Some("next year".into()),
            ..Default::default()
        };
        assert!(matches!(
            gw.create_record(bad_year).await,
            Err(GatewayError::Validation(_))
        ));
        assert!(gw.list_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn numeric_zero_target_or_year_is_missing() {
        let gw = gateway().await;
        let zero_target = CreateGoal {
            title: Some("Laptop".into()),
            target: Some(0_i64.into()),
        };
        assert!(matches!(
            gw.create_goal(zero_target).await,
            Err(GatewayError::Validation(_))
        ));

        let zero_year = CreateRecord {
            bulan: Some("Mei".into()),
            tahun: Some(0_i64.into()),
            ..Default::default()
        };
        assert!(matches!(
            gw.create_record(zero_year).await,
            Err(GatewayError::Validation(_))
        ));

        // a typed "0" is still a value
        let goal = gw.create_goal(goal_req("Laptop", "0")).await.unwrap();
        assert_eq!(goal.entity.target, "0");
        assert!(gw.list_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_quantity_outcome_is_accepted() {
        let gw = gateway().await;
        let req = CreateOutcome {
            title: Some("Gift".into()),
            price: Some("150.000".into()),
            quantity: Some(0_i64.into()),
            total: Some("0".into()),
        };
        let created = gw.create_outcome(req).await.unwrap();
        assert_eq!(created.entity.qty, 0.0);
        assert_eq!(created.entity.total, "0");
        assert_eq!(created.view.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn outcome_without_quantity_is_rejected() {
        let gw = gateway().await;
        let req = CreateOutcome {
            title: Some("Gift".into()),
            price: Some("150.000".into()),
            quantity: None,
            total: Some("150.000".into()),
        };
        assert!(matches!(
            gw.create_outcome(req).await,
            Err(GatewayError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn deleting_unknown_record_leaves_store_unchanged() {
        let gw = gateway().await;
        gw.create_record(record_req("Laptop", 1)).await.unwrap();
        let before = gw.list_records().await.unwrap();

        for id in ["9999", "not-an-id", ""] {
            let err = gw.delete_record(id).await.unwrap_err();
            assert!(matches!(err, GatewayError::NotFound(_)), "{err:?}");
        }
        assert_eq!(gw.list_records().await.unwrap(), before);
    }

    #[tokio::test]
    async fn each_mutation_publishes_one_full_view() {
        let gw = gateway().await;
        gw.prime().await.unwrap();
        let mut sub = gw.channel().subscribe();
        assert_eq!(sub.next().await.unwrap().seq, 1);

        gw.create_goal(goal_req("Laptop", "10")).await.unwrap();
        let after_create = sub.next().await.unwrap();
        assert_eq!(after_create.seq, 2);
        assert_eq!(after_create.view.goals.len(), 1);

        let failed = gw.delete_outcome("42").await;
        assert!(failed.is_err());
        let outcome = gw
            .create_outcome(CreateOutcome {
                title: Some("Mouse".into()),
                price: Some("100".into()),
                quantity: Some(1_i64.into()),
                total: Some("100".into()),
            })
            .await
            .unwrap();
        let after_outcome = sub.next().await.unwrap();
        assert_eq!(after_outcome.seq, 3, "failed mutations publish nothing");
        assert_eq!(*after_outcome.view, outcome.view);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn last_publication_matches_store_under_concurrent_writes() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("race.db").display());
        let pool = connection::get_db_pool(&url).await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        let gw = Gateway::new(pool, BroadcastChannel::new(64));

        let writes = (0..16).map(|i| {
            let gw = gw.clone();
            tokio::spawn(async move { gw.create_goal(goal_req(&format!("goal-{i}"), "10")).await })
        });
        for done in futures::future::join_all(writes).await {
            done.unwrap().unwrap();
        }

        let latest = gw.channel().latest().unwrap();
        assert_eq!(latest.seq, 16);
        assert_eq!(*latest.view, gw.snapshot().await.unwrap());
        assert_eq!(latest.view.goals.len(), 16);
    }
}
