//! Period resolution from free-text questions
//!
//! Turns a question like "how much did I spend between jan and mar 2024?"
//! into a concrete reporting window. Resolution is an ordered rule list,
//! first match wins; the order is deliberate and covered by tests:
//!
//! 1. All-time keywords ("all time", "lifetime", ...)
//! 2. Explicit month-to-month range ("jan 2024 to mar 2024")
//! 3. Standalone four-digit year ("2023")
//! 4. Single month name with optional year ("march", "jan 2024")
//! 5. Relative numeric span ("3 months", "45 days")
//! 6. Named relative keywords ("last month", "this year", ...)
//! 7. Default: current month to now
//!
//! The current time is an explicit parameter so resolution is a pure
//! function and tests are deterministic.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use regex::Regex;

use crate::models::ResolvedPeriod;

const MONTH_PATTERN: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

static MONTH_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b{m}\.?\s*(\d{{4}})?\s*(?:to|until|through|thru|and|-)\s*{m}\.?\s*(\d{{4}})?\b",
        m = MONTH_PATTERN
    ))
    .expect("valid regex")
});

static MONTH_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b{m}\.?,?\s*(\d{{4}})\b", m = MONTH_PATTERN)).expect("valid regex")
});

static MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b{m}\b", m = MONTH_PATTERN)).expect("valid regex"));

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("valid regex"));

static SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\s*(day|week|month|year)s?\b").expect("valid regex"));

/// Phrases that force all-time reporting regardless of other date tokens
const ALL_TIME_KEYWORDS: &[&str] = &[
    "all time",
    "all-time",
    "alltime",
    "lifetime",
    "overall",
    "total expenses",
    "total income",
    "everything",
];

/// Resolve the reporting window for a question
///
/// Deterministic given `now`. Never fails; unparsable questions fall
/// through to the current month.
pub fn resolve(question: &str, now: DateTime<Utc>) -> ResolvedPeriod {
    let lower = question.to_lowercase();

    type Rule = fn(&str, DateTime<Utc>) -> Option<ResolvedPeriod>;
    // Order matters: see module docs
    const RULES: &[Rule] = &[
        all_time_rule,
        month_range_rule,
        standalone_year_rule,
        single_month_rule,
        relative_span_rule,
        named_relative_rule,
    ];

    for rule in RULES {
        if let Some(period) = rule(&lower, now) {
            return period;
        }
    }

    current_month_to_now(now)
}

/// Rule 1: all-time keywords
fn all_time_rule(question: &str, _now: DateTime<Utc>) -> Option<ResolvedPeriod> {
    if ALL_TIME_KEYWORDS.iter().any(|kw| question.contains(kw)) {
        Some(ResolvedPeriod::all_time())
    } else {
        None
    }
}

/// Rule 2: explicit month-to-month range
///
/// Start year defaults to the current year, end year to the start year.
/// Inverted spans fall through to later rules.
fn month_range_rule(question: &str, now: DateTime<Utc>) -> Option<ResolvedPeriod> {
    let caps = MONTH_RANGE_RE.captures(question)?;

    let start_token = caps.get(1)?.as_str();
    let end_token = caps.get(3)?.as_str();
    let start_month = month_number(start_token)?;
    let end_month = month_number(end_token)?;

    let start_year: i32 = match caps.get(2) {
        Some(y) => y.as_str().parse().ok()?,
        None => now.year(),
    };
    let end_year: i32 = match caps.get(4) {
        Some(y) => y.as_str().parse().ok()?,
        None => start_year,
    };

    let start = month_start(start_year, start_month)?;
    let end = month_end(end_year, end_month)?;
    if start > end {
        return None;
    }

    let label = format!(
        "{} {} to {} {}",
        capitalize(start_token),
        start_year,
        capitalize(end_token),
        end_year
    );
    Some(ResolvedPeriod::bounded(start, end, label))
}

/// Rule 3: standalone four-digit year
///
/// A 4-digit number inside a relative span ("2000 days") or attached to a
/// month name ("jan 2024") is not standalone and is left for later rules.
fn standalone_year_rule(question: &str, now: DateTime<Utc>) -> Option<ResolvedPeriod> {
    let span_ranges: Vec<_> = SPAN_RE.find_iter(question).map(|m| m.range()).collect();
    let month_year_ranges: Vec<_> = MONTH_YEAR_RE
        .find_iter(question)
        .map(|m| m.range())
        .collect();

    for m in YEAR_RE.find_iter(question) {
        let covered = span_ranges
            .iter()
            .chain(month_year_ranges.iter())
            .any(|r| r.start <= m.start() && m.end() <= r.end);
        if covered {
            continue;
        }

        let year: i32 = m.as_str().parse().ok()?;
        if !(2000..=now.year() + 10).contains(&year) {
            continue;
        }

        let start = month_start(year, 1)?;
        let end = if year == now.year() {
            now
        } else {
            month_end(year, 12)?
        };
        return Some(ResolvedPeriod::bounded(start, end, year.to_string()));
    }
    None
}

/// Rule 4: single month name, optional year
fn single_month_rule(question: &str, now: DateTime<Utc>) -> Option<ResolvedPeriod> {
    let m = MONTH_RE.find(question)?;
    let month = month_number(m.as_str())?;

    // Use the year if one directly follows the month token
    let year: i32 = MONTH_YEAR_RE
        .captures(question)
        .filter(|c| c.get(0).map(|w| w.start()) == Some(m.start()))
        .and_then(|c| c.get(2)?.as_str().parse().ok())
        .unwrap_or_else(|| now.year());

    let start = month_start(year, month)?;
    let end = month_end(year, month)?;
    let label = format!("{} {}", capitalize(m.as_str()), year);
    Some(ResolvedPeriod::bounded(start, end, label))
}

/// Rule 5: relative numeric span, lower bound aligned to the unit's
/// calendar start
fn relative_span_rule(question: &str, now: DateTime<Utc>) -> Option<ResolvedPeriod> {
    let caps = SPAN_RE.captures(question)?;
    let n: u32 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str();

    let today = now.date_naive();
    let start_date = match unit {
        "day" => today.checked_sub_signed(Duration::days(n as i64))?,
        "week" => {
            let d = today.checked_sub_signed(Duration::weeks(n as i64))?;
            // Align to the Monday of that week
            d.checked_sub_signed(Duration::days(d.weekday().num_days_from_monday() as i64))?
        }
        "month" => today.checked_sub_months(Months::new(n))?.with_day(1)?,
        "year" => NaiveDate::from_ymd_opt(now.year().checked_sub(n as i32)?, 1, 1)?,
        _ => return None,
    };

    let start = start_date.and_hms_opt(0, 0, 0)?.and_utc();
    let plural = if n == 1 { "" } else { "s" };
    let label = format!("Last {} {}{}", n, capitalize(unit), plural);
    Some(ResolvedPeriod::bounded(start, now, label))
}

/// Rule 6: named relative keywords
fn named_relative_rule(question: &str, now: DateTime<Utc>) -> Option<ResolvedPeriod> {
    let today = now.date_naive();

    if question.contains("this month") || question.contains("current month") {
        return Some(current_month_to_now(now));
    }

    if question.contains("last month") || question.contains("previous month") {
        let this_month_start = today.with_day(1)?;
        let prev_month_end = this_month_start.pred_opt()?;
        let start = prev_month_end.with_day(1)?.and_hms_opt(0, 0, 0)?.and_utc();
        let end = prev_month_end.and_hms_opt(23, 59, 59)?.and_utc();
        return Some(ResolvedPeriod::bounded(start, end, "Last Month"));
    }

    if question.contains("this week") || question.contains("past week") {
        let start = today
            .checked_sub_signed(Duration::days(7))?
            .and_hms_opt(0, 0, 0)?
            .and_utc();
        return Some(ResolvedPeriod::bounded(start, now, "Last 7 Days"));
    }

    if question.contains("this year") {
        let start = month_start(now.year(), 1)?;
        return Some(ResolvedPeriod::bounded(start, now, "This Year"));
    }

    if question.contains("last year") {
        let year = now.year() - 1;
        return Some(ResolvedPeriod::bounded(
            month_start(year, 1)?,
            month_end(year, 12)?,
            "Last Year",
        ));
    }

    None
}

/// Rule 7 / fallback: first day of the current month up to now
fn current_month_to_now(now: DateTime<Utc>) -> ResolvedPeriod {
    let start = now
        .date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(now);
    ResolvedPeriod::bounded(start, now, "This Month")
}

/// Map a month token (full name or abbreviation) to its 1-based number
fn month_number(token: &str) -> Option<u32> {
    let number = match token.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(number)
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    Some(
        NaiveDate::from_ymd_opt(year, month, 1)?
            .and_hms_opt(0, 0, 0)?
            .and_utc(),
    )
}

/// Last instant (23:59:59) of the given calendar month
fn month_end(year: i32, month: u32) -> Option<DateTime<Utc>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = first.checked_add_months(Months::new(1))?;
    Some(
        next_first
            .pred_opt()?
            .and_hms_opt(23, 59, 59)?
            .and_utc(),
    )
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn date(period: &ResolvedPeriod) -> (NaiveDate, NaiveDate) {
        period.date_range().expect("bounded period")
    }

    #[test]
    fn all_time_keywords_win_over_everything_else() {
        let now = at(2025, 6, 15);
        for q in [
            "show me all time spending",
            "lifetime income",
            "overall expenses in jan 2024",
            "total expenses for march",
            "where did everything go",
        ] {
            let p = resolve(q, now);
            assert!(p.is_all_time, "expected all-time for {:?}", q);
            assert!(p.start.is_none() && p.end.is_none());
            assert_eq!(p.label, "All Time");
        }
    }

    #[test]
    fn month_range_with_years() {
        let p = resolve("expenses between jan 2024 and mar 2024", at(2025, 6, 15));
        assert_eq!(p.label, "Jan 2024 to Mar 2024");
        assert_eq!(
            date(&p),
            (
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
            )
        );
        assert_eq!(
            p.end.unwrap().time(),
            chrono::NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn month_range_years_default_to_current_then_start() {
        let p = resolve("between March and June", at(2025, 6, 15));
        assert_eq!(p.label, "March 2025 to June 2025");
        assert_eq!(
            date(&p),
            (
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
            )
        );
    }

    #[test]
    fn month_range_spanning_years() {
        let p = resolve("nov 2023 to feb 2024", at(2025, 6, 15));
        assert_eq!(
            date(&p),
            (
                NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
            )
        );
    }

    #[test]
    fn inverted_month_range_falls_through() {
        // mar..jan inverted; the attached year is not standalone either, so
        // this lands on the single-month rule
        let p = resolve("mar 2024 to jan 2024", at(2025, 6, 15));
        assert!(!p.is_all_time);
        assert_eq!(p.label, "Mar 2024");
    }

    #[test]
    fn standalone_year() {
        let p = resolve("how much did I spend in 2023", at(2025, 6, 15));
        assert_eq!(p.label, "2023");
        assert_eq!(
            date(&p),
            (
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
            )
        );
    }

    #[test]
    fn current_year_is_clipped_to_now() {
        let now = at(2025, 6, 15);
        let p = resolve("spending in 2025", now);
        assert_eq!(p.label, "2025");
        assert_eq!(p.start.unwrap().date_naive(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(p.end.unwrap(), now);
    }

    #[test]
    fn year_out_of_range_is_ignored() {
        // 1999 and 2050 (> now.year() + 10) are not plausible report years
        let p = resolve("spending in 1999", at(2025, 6, 15));
        assert_eq!(p.label, "This Month");
        let p = resolve("spending in 2050", at(2025, 6, 15));
        assert_eq!(p.label, "This Month");
    }

    #[test]
    fn span_number_is_not_mistaken_for_a_year() {
        // "2000 days" must resolve as a relative span, not the year 2000
        let now = at(2025, 6, 15);
        let p = resolve("expenses over 2000 days", now);
        assert_eq!(p.label, "Last 2000 Days");
        assert_eq!(p.end.unwrap(), now);
    }

    #[test]
    fn single_month_defaults_to_current_year() {
        let p = resolve("how much in march?", at(2025, 6, 15));
        assert_eq!(p.label, "March 2025");
        assert_eq!(
            date(&p),
            (
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
            )
        );
    }

    #[test]
    fn single_month_with_year() {
        let p = resolve("spending in jan 2024", at(2025, 6, 15));
        assert_eq!(p.label, "Jan 2024");
        assert_eq!(
            date(&p),
            (
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
            )
        );
    }

    #[test]
    fn relative_span_days() {
        let now = at(2025, 6, 15);
        let p = resolve("past 10 days of spending", now);
        assert_eq!(p.label, "Last 10 Days");
        assert_eq!(
            p.start.unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 5)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
        );
        assert_eq!(p.end.unwrap(), now);
    }

    #[test]
    fn relative_span_weeks_aligns_to_monday() {
        // 2025-06-15 is a Sunday; two weeks back is 2025-06-01 (Sunday),
        // aligned to Monday 2025-05-26
        let p = resolve("last 2 weeks", at(2025, 6, 15));
        assert_eq!(p.label, "Last 2 Weeks");
        assert_eq!(
            p.start.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2025, 5, 26).unwrap()
        );
    }

    #[test]
    fn relative_span_months_aligns_to_month_start() {
        let p = resolve("show 3 months of expenses", at(2025, 6, 15));
        assert_eq!(p.label, "Last 3 Months");
        assert_eq!(
            p.start.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }

    #[test]
    fn relative_span_singular_label() {
        let p = resolve("1 month of spending", at(2025, 6, 15));
        assert_eq!(p.label, "Last 1 Month");
        let p = resolve("1 year of spending", at(2025, 6, 15));
        assert_eq!(p.label, "Last 1 Year");
        assert_eq!(
            p.start.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn last_month_is_the_full_previous_calendar_month() {
        let p = resolve("how did I do last month?", at(2025, 6, 15));
        assert_eq!(p.label, "Last Month");
        assert_eq!(
            date(&p),
            (
                NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 31).unwrap()
            )
        );
        assert_eq!(
            p.end.unwrap().time(),
            chrono::NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn last_month_across_year_boundary() {
        let p = resolve("last month", at(2025, 1, 10));
        assert_eq!(
            date(&p),
            (
                NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
            )
        );
    }

    #[test]
    fn this_month_runs_to_now() {
        let now = at(2025, 6, 15);
        let p = resolve("spending this month", now);
        assert_eq!(p.label, "This Month");
        assert_eq!(
            p.start.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert_eq!(p.end.unwrap(), now);
    }

    #[test]
    fn this_and_last_year_keywords() {
        let now = at(2025, 6, 15);
        let p = resolve("how is this year going", now);
        assert_eq!(p.label, "This Year");
        assert_eq!(p.end.unwrap(), now);

        let p = resolve("compare to last year", now);
        assert_eq!(p.label, "Last Year");
        assert_eq!(
            date(&p),
            (
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
            )
        );
    }

    #[test]
    fn default_is_current_month() {
        let now = at(2025, 6, 15);
        let p = resolve("am I doing okay?", now);
        assert_eq!(p.label, "This Month");
        assert_eq!(
            p.start.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert_eq!(p.end.unwrap(), now);
    }

    #[test]
    fn resolution_is_idempotent() {
        let now = at(2025, 6, 15);
        for q in ["last month", "3 weeks", "jan to mar", "all time", "hello"] {
            assert_eq!(resolve(q, now), resolve(q, now));
        }
    }

    #[test]
    fn bounded_periods_are_ordered() {
        let now = at(2025, 6, 15);
        for q in [
            "last month",
            "45 days",
            "march",
            "2023",
            "jan 2024 to mar 2025",
            "this week",
            "whatever",
        ] {
            let p = resolve(q, now);
            assert!(!p.is_all_time);
            assert!(p.start.unwrap() <= p.end.unwrap(), "inverted for {:?}", q);
        }
    }
}
