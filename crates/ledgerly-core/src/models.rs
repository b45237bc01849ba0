//! Domain models for Ledgerly

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fallback group name for records without a category/source
pub const UNCATEGORIZED: &str = "Uncategorized";

/// An expense record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub icon: Option<String>,
    pub category: Option<String>,
    /// Stored amount; missing values are tolerated and read as 0
    pub amount: f64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// An income record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
    pub id: i64,
    pub user_id: i64,
    pub icon: Option<String>,
    pub source: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating an expense record
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub icon: Option<String>,
    pub category: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
}

/// Payload for creating an income record
#[derive(Debug, Clone, Deserialize)]
pub struct NewIncome {
    pub icon: Option<String>,
    pub source: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
}

/// The reporting window resolved from a free-text question
///
/// Immutable once computed. When `is_all_time` is false, both bounds are
/// present and `start <= end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPeriod {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Human-readable name for the window, e.g. "Last 3 Months"
    pub label: String,
    pub is_all_time: bool,
}

impl ResolvedPeriod {
    pub fn all_time() -> Self {
        Self {
            start: None,
            end: None,
            label: "All Time".to_string(),
            is_all_time: true,
        }
    }

    pub fn bounded(start: DateTime<Utc>, end: DateTime<Utc>, label: impl Into<String>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            label: label.into(),
            is_all_time: false,
        }
    }

    /// Date range as inclusive calendar dates, `None` for all-time
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start.date_naive(), end.date_naive())),
            _ => None,
        }
    }
}

/// Per-group total within the resolved period
#[derive(Debug, Clone, Serialize)]
pub struct GroupTotal {
    pub name: String,
    pub amount: f64,
}

/// Expense/income totals for one calendar month of full history
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    /// "YYYY-MM"
    pub month: String,
    pub expenses: f64,
    pub income: f64,
    pub net: f64,
    /// net/income * 100, 0 when there is no income
    pub savings_rate: f64,
}

/// Aggregated view of a user's ledger for one resolved period
///
/// Derived per request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSnapshot {
    pub period_expense_total: f64,
    pub period_expense_count: usize,
    pub period_income_total: f64,
    pub period_income_count: usize,
    pub all_time_expense_total: f64,
    pub all_time_income_total: f64,
    /// Period expense groups, sorted descending by amount
    pub expenses_by_category: Vec<GroupTotal>,
    pub income_by_source: Vec<GroupTotal>,
    /// Full-history monthly breakdown, sorted chronologically
    pub monthly: Vec<MonthlySummary>,
}

impl AggregateSnapshot {
    /// All-time savings (income minus expenses)
    pub fn all_time_savings(&self) -> f64 {
        self.all_time_income_total - self.all_time_expense_total
    }

    /// True when the resolved period holds no records at all
    pub fn period_is_empty(&self) -> bool {
        self.period_expense_count == 0 && self.period_income_count == 0
    }
}

/// Statistics subset returned to the client alongside the advice
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub period_expenses: f64,
    pub period_income: f64,
    pub total_expenses: f64,
    pub total_income: f64,
    pub savings: f64,
    pub expenses_by_category: Vec<GroupTotal>,
}

impl From<&AggregateSnapshot> for UserStats {
    fn from(snapshot: &AggregateSnapshot) -> Self {
        Self {
            period_expenses: snapshot.period_expense_total,
            period_income: snapshot.period_income_total,
            total_expenses: snapshot.all_time_expense_total,
            total_income: snapshot.all_time_income_total,
            savings: snapshot.all_time_savings(),
            expenses_by_category: snapshot.expenses_by_category.clone(),
        }
    }
}

/// Result of one advisor request
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryResponse {
    pub advice: String,
    pub period: String,
    pub stats: UserStats,
}
