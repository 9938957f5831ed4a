use std::collections::HashMap;

use rust_decimal::Decimal;

use super::amount::{parse_grouped, parse_plain, to_wire_string};
use super::{DashboardView, RekapInvest};
use crate::database::models::{Goal, Outcome, Record};

/// Builds the dashboard from full snapshots of the three tables.
///
/// Pure: the same input always yields the same view, and `rekap_invest`
/// follows the order of `goals`.
pub fn compute(goals: Vec<Goal>, outcomes: Vec<Outcome>, records: Vec<Record>) -> DashboardView {
    let total_outcome = total_outcome(&outcomes);
    let rekap_invest = rekap_invest(&goals, &records);

    DashboardView {
        goals,
        outcomes,
        records,
        total_outcome,
        rekap_invest,
    }
}

/// Sum of outcome totals. Totals that do not parse count as zero so old,
/// hand-typed rows can never break the dashboard.
pub fn total_outcome(outcomes: &[Outcome]) -> Decimal {
    outcomes.iter().fold(Decimal::ZERO, |acc, o| {
        let value = parse_grouped(&o.total).unwrap_or(Decimal::ZERO);
        acc.checked_add(value).unwrap_or(acc)
    })
}

/// One row per goal with the sum of the records whose `type_invest` equals
/// the goal title. Goals without records get `"0"`; records that match no
/// goal are left out.
pub fn rekap_invest(goals: &[Goal], records: &[Record]) -> Vec<RekapInvest> {
    let mut collected: HashMap<&str, Decimal> = HashMap::new();
    for record in records {
        let Some(type_invest) = record.type_invest.as_deref() else {
            continue;
        };
        let value = parse_plain(&record.total).unwrap_or(Decimal::ZERO);
        let sum = collected.entry(type_invest).or_insert(Decimal::ZERO);
        *sum = sum.checked_add(value).unwrap_or(*sum);
    }

    goals
        .iter()
        .map(|goal| {
            let sum = collected
                .get(goal.title.as_str())
                .copied()
                .unwrap_or(Decimal::ZERO);
            RekapInvest {
                id: goal.id,
                type_invest: goal.title.clone(),
                total_terkumpul: to_wire_string(sum),
                target: goal.target.clone(),
            }
        })
        .collect()
}
