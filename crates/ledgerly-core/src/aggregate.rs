//! Ledger aggregation for the advisor pipeline
//!
//! Reduces a user's expense/income records into the per-period and
//! all-time figures the context formatter renders. The four reads (period
//! expenses, period income, all-time expenses, all-time income) are
//! independent and issued concurrently; results are combined only after all
//! have resolved. Read-only.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::models::{
    AggregateSnapshot, Expense, GroupTotal, Income, MonthlySummary, ResolvedPeriod, UNCATEGORIZED,
};

/// Build the aggregate snapshot for one user and resolved period
///
/// For all-time periods the period reads are the unfiltered reads, so only
/// two queries are issued.
pub async fn aggregate(
    db: &Database,
    user_id: i64,
    period: &ResolvedPeriod,
) -> Result<AggregateSnapshot> {
    let range = period.date_range();

    let (period_expenses, period_income, all_expenses, all_income) = if period.is_all_time {
        let (expenses, income) = tokio::try_join!(
            read_expenses(db.clone(), user_id, None),
            read_income(db.clone(), user_id, None),
        )?;
        (expenses.clone(), income.clone(), expenses, income)
    } else {
        tokio::try_join!(
            read_expenses(db.clone(), user_id, range),
            read_income(db.clone(), user_id, range),
            read_expenses(db.clone(), user_id, None),
            read_income(db.clone(), user_id, None),
        )?
    };

    debug!(
        user_id,
        period = %period.label,
        expenses = period_expenses.len(),
        income = period_income.len(),
        "Ledger records fetched"
    );

    let expenses_by_category = group_totals(
        period_expenses
            .iter()
            .map(|e| (e.category.as_deref(), e.amount)),
    );
    let income_by_source = group_totals(
        period_income
            .iter()
            .map(|i| (i.source.as_deref(), i.amount)),
    );

    Ok(AggregateSnapshot {
        period_expense_total: period_expenses.iter().map(|e| e.amount).sum(),
        period_expense_count: period_expenses.len(),
        period_income_total: period_income.iter().map(|i| i.amount).sum(),
        period_income_count: period_income.len(),
        all_time_expense_total: all_expenses.iter().map(|e| e.amount).sum(),
        all_time_income_total: all_income.iter().map(|i| i.amount).sum(),
        expenses_by_category,
        income_by_source,
        monthly: monthly_breakdown(&all_expenses, &all_income),
    })
}

async fn read_expenses(
    db: Database,
    user_id: i64,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<Expense>> {
    tokio::task::spawn_blocking(move || db.list_expenses(user_id, range)).await?
}

async fn read_income(
    db: Database,
    user_id: i64,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<Income>> {
    tokio::task::spawn_blocking(move || db.list_income(user_id, range)).await?
}

/// Sum amounts per group, missing group names fall back to "Uncategorized";
/// sorted descending by amount
fn group_totals<'a>(records: impl Iterator<Item = (Option<&'a str>, f64)>) -> Vec<GroupTotal> {
    let mut sums: HashMap<String, f64> = HashMap::new();
    for (name, amount) in records {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => UNCATEGORIZED,
        };
        *sums.entry(name.to_string()).or_insert(0.0) += amount;
    }

    let mut totals: Vec<GroupTotal> = sums
        .into_iter()
        .map(|(name, amount)| GroupTotal { name, amount })
        .collect();
    totals.sort_by(|a, b| b.amount.total_cmp(&a.amount).then(a.name.cmp(&b.name)));
    totals
}

/// Full-history totals keyed by calendar month, sorted chronologically
fn monthly_breakdown(expenses: &[Expense], income: &[Income]) -> Vec<MonthlySummary> {
    // BTreeMap: "YYYY-MM" keys sort chronologically
    let mut months: std::collections::BTreeMap<String, (f64, f64)> = Default::default();

    for e in expenses {
        let key = month_key(e.date);
        months.entry(key).or_default().0 += e.amount;
    }
    for i in income {
        let key = month_key(i.date);
        months.entry(key).or_default().1 += i.amount;
    }

    months
        .into_iter()
        .map(|(month, (expense_total, income_total))| {
            let net = income_total - expense_total;
            let savings_rate = if income_total > 0.0 {
                net / income_total * 100.0
            } else {
                0.0
            };
            MonthlySummary {
                month,
                expenses: expense_total,
                income: income_total,
                net,
                savings_rate,
            }
        })
        .collect()
}

fn month_key(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}
