//! Financial context formatting
//!
//! Renders the aggregate snapshot plus the resolved period into the
//! fixed-structure text block handed to the language model. This string is
//! the only user data the model ever sees: amounts are rounded to whole
//! currency units, percentages to one decimal, and out-of-period records
//! appear only in the clearly labeled all-time section.

use crate::models::{AggregateSnapshot, ResolvedPeriod};

/// Marker line emitted when a period holds no transactions. The prompt
/// rules reference this text verbatim; changing it breaks the contract.
pub const NO_RECORDS_MARKER: &str = "→ NO RECORDS IN THIS PERIOD";

/// Render the snapshot into the prompt context block
pub fn format_context(snapshot: &AggregateSnapshot, period: &ResolvedPeriod) -> String {
    let mut out = String::new();

    out.push_str(&format!("Requested period: {}\n", period.label));
    out.push_str(&format!("Date range: {}\n", date_range_line(period)));
    out.push('\n');

    out.push_str(&format!(
        "PERIOD EXPENSES: ₹{:.0} across {} transaction(s)\n",
        snapshot.period_expense_total, snapshot.period_expense_count
    ));
    out.push_str(&format!(
        "PERIOD INCOME: ₹{:.0} across {} transaction(s)\n",
        snapshot.period_income_total, snapshot.period_income_count
    ));
    if snapshot.period_is_empty() {
        out.push_str(NO_RECORDS_MARKER);
        out.push('\n');
    }
    out.push('\n');

    if !snapshot.expenses_by_category.is_empty() {
        out.push_str("Expenses by category:\n");
        for group in &snapshot.expenses_by_category {
            out.push_str(&format!("  {}: ₹{:.0}\n", group.name, group.amount));
        }
    }
    if !snapshot.income_by_source.is_empty() {
        out.push_str("Income by source:\n");
        for group in &snapshot.income_by_source {
            out.push_str(&format!("  {}: ₹{:.0}\n", group.name, group.amount));
        }
    }

    if !snapshot.monthly.is_empty() {
        out.push_str("\nMonthly history:\n");
        for month in &snapshot.monthly {
            out.push_str(&format!(
                "  {}: expenses ₹{:.0}, income ₹{:.0}, net ₹{:.0} (savings {:.1}%)\n",
                month.month, month.expenses, month.income, month.net, month.savings_rate
            ));
        }
    }

    out.push_str(&format!(
        "\nALL-TIME (only reference these figures if the question explicitly asks for \
         all-time/lifetime/overall totals):\n  expenses ₹{:.0}, income ₹{:.0}, savings ₹{:.0}\n",
        snapshot.all_time_expense_total,
        snapshot.all_time_income_total,
        snapshot.all_time_savings()
    ));

    out
}

fn date_range_line(period: &ResolvedPeriod) -> String {
    match period.date_range() {
        Some((start, end)) => format!("{} to {}", start, end),
        None => "All recorded history".to_string(),
    }
}
