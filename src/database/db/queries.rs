use sqlx::{Pool, Sqlite};

use crate::database::models::{Goal, NewOutcome, NewRecord, Outcome, Record};

/*
SQL for the three dashboard tables.
Lists come back newest first; deletes hand back the removed row,
or None when the id does not exist.
 */

/*==========Goal Queries=========== */

pub async fn list_goals(pool: &Pool<Sqlite>) -> Result<Vec<Goal>, sqlx::Error> {
    sqlx::query_as::<_, Goal>(
        r#"
        SELECT id, title, target, created_at
        FROM goals
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn create_goal(pool: &Pool<Sqlite>, title: &str, target: &str) -> Result<Goal, sqlx::Error> {
    sqlx::query_as::<_, Goal>(
        r#"
        INSERT INTO goals (title, target, created_at)
        VALUES (?, ?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        RETURNING id, title, target, created_at
        "#,
    )
    .bind(title)
    .bind(target)
    .fetch_one(pool)
    .await
}

// Records pointing at this goal's title are left alone.
pub async fn delete_goal(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Goal>, sqlx::Error> {
    sqlx::query_as::<_, Goal>(
        r#"
        DELETE FROM goals
        WHERE id = ?
        RETURNING id, title, target, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/*==========Outcome Queries=========== */

pub async fn list_outcomes(pool: &Pool<Sqlite>) -> Result<Vec<Outcome>, sqlx::Error> {
    sqlx::query_as::<_, Outcome>(
        r#"
        SELECT id, title, price, qty, total, created_at
        FROM outcomes
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn create_outcome(pool: &Pool<Sqlite>, new: &NewOutcome) -> Result<Outcome, sqlx::Error> {
    sqlx::query_as::<_, Outcome>(
        r#"
        INSERT INTO outcomes (title, price, qty, total, created_at)
        VALUES (?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        RETURNING id, title, price, qty, total, created_at
        "#,
    )
    .bind(&new.title)
    .bind(&new.price)
    .bind(new.qty)
    .bind(&new.total)
    .fetch_one(pool)
    .await
}

pub async fn delete_outcome(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Outcome>, sqlx::Error> {
    sqlx::query_as::<_, Outcome>(
        r#"
        DELETE FROM outcomes
        WHERE id = ?
        RETURNING id, title, price, qty, total, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/*==========Record Queries=========== */

pub async fn list_records(pool: &Pool<Sqlite>) -> Result<Vec<Record>, sqlx::Error> {
    sqlx::query_as::<_, Record>(
        r#"
        SELECT
            id, bulan, tahun, income, outcome, emergency_outcome,
            emergency_outcome_reason, type_invest, total, created_at
        FROM records
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

// No uniqueness on (bulan, tahun): a second record for the same month is an amendment.
pub async fn create_record(pool: &Pool<Sqlite>, new: &NewRecord) -> Result<Record, sqlx::Error> {
    sqlx::query_as::<_, Record>(
        r#"
        INSERT INTO records (
            bulan, tahun, income, outcome, emergency_outcome,
            emergency_outcome_reason, type_invest, total, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        RETURNING
            id, bulan, tahun, income, outcome, emergency_outcome,
            emergency_outcome_reason, type_invest, total, created_at
        "#,
    )
    .bind(&new.bulan)
    .bind(new.tahun)
    .bind(&new.income)
    .bind(&new.outcome)
    .bind(&new.emergency_outcome)
    .bind(&new.emergency_outcome_reason)
    .bind(new.type_invest.as_deref())
    .bind(&new.total)
    .fetch_one(pool)
    .await
}

pub async fn delete_record(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Record>, sqlx::Error> {
    sqlx::query_as::<_, Record>(
        r#"
        DELETE FROM records
        WHERE id = ?
        RETURNING
            id, bulan, tahun, income, outcome, emergency_outcome,
            emergency_outcome_reason, type_invest, total, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
