//! Expense and income queries
//!
//! All queries are scoped to an owner. The range-filtered list is the one
//! the aggregator issues; `range: None` is the all-time read.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Row};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Expense, Income, NewExpense, NewIncome};

/// Parse a SQLite datetime string ("YYYY-MM-DD HH:MM:SS")
fn parse_datetime(s: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        icon: row.get(2)?,
        category: row.get(3)?,
        // Malformed/missing amounts are tolerated as zero
        amount: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
        date: row
            .get::<_, String>(5)?
            .parse()
            .unwrap_or_else(|_| Utc::now().date_naive()),
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn income_from_row(row: &Row<'_>) -> rusqlite::Result<Income> {
    Ok(Income {
        id: row.get(0)?,
        user_id: row.get(1)?,
        icon: row.get(2)?,
        source: row.get(3)?,
        amount: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
        date: row
            .get::<_, String>(5)?
            .parse()
            .unwrap_or_else(|_| Utc::now().date_naive()),
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

impl Database {
    /// Insert an expense, returning the stored record
    pub fn insert_expense(&self, user_id: i64, new: &NewExpense) -> Result<Expense> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO expenses (user_id, icon, category, amount, date) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, new.icon, new.category, new.amount, new.date.to_string()],
        )?;
        let id = conn.last_insert_rowid();
        self.get_expense(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("expense {}", id)))
    }

    pub fn get_expense(&self, user_id: i64, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, icon, category, amount, date, created_at
             FROM expenses WHERE id = ?1 AND user_id = ?2",
        )?;
        let mut rows = stmt.query_map(params![id, user_id], expense_from_row)?;
        rows.next().transpose().map_err(Into::into)
    }

    /// List a user's expenses, optionally restricted to an inclusive date
    /// range, newest first
    pub fn list_expenses(
        &self,
        user_id: i64,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut results = Vec::new();

        match range {
            Some((from, to)) => {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, icon, category, amount, date, created_at
                     FROM expenses
                     WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
                     ORDER BY date DESC, id DESC",
                )?;
                let rows = stmt.query_map(
                    params![user_id, from.to_string(), to.to_string()],
                    expense_from_row,
                )?;
                for row in rows {
                    results.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, icon, category, amount, date, created_at
                     FROM expenses WHERE user_id = ?1
                     ORDER BY date DESC, id DESC",
                )?;
                let rows = stmt.query_map(params![user_id], expense_from_row)?;
                for row in rows {
                    results.push(row?);
                }
            }
        }

        Ok(results)
    }

    /// Delete an expense owned by the user; true when a row was removed
    pub fn delete_expense(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn.execute(
            "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(n > 0)
    }

    /// Insert an income record, returning the stored record
    pub fn insert_income(&self, user_id: i64, new: &NewIncome) -> Result<Income> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO income (user_id, icon, source, amount, date) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, new.icon, new.source, new.amount, new.date.to_string()],
        )?;
        let id = conn.last_insert_rowid();
        self.get_income(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("income {}", id)))
    }

    pub fn get_income(&self, user_id: i64, id: i64) -> Result<Option<Income>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, icon, source, amount, date, created_at
             FROM income WHERE id = ?1 AND user_id = ?2",
        )?;
        let mut rows = stmt.query_map(params![id, user_id], income_from_row)?;
        rows.next().transpose().map_err(Into::into)
    }

    /// List a user's income, optionally restricted to an inclusive date
    /// range, newest first
    pub fn list_income(
        &self,
        user_id: i64,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Income>> {
        let conn = self.conn()?;
        let mut results = Vec::new();

        match range {
            Some((from, to)) => {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, icon, source, amount, date, created_at
                     FROM income
                     WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
                     ORDER BY date DESC, id DESC",
                )?;
                let rows = stmt.query_map(
                    params![user_id, from.to_string(), to.to_string()],
                    income_from_row,
                )?;
                for row in rows {
                    results.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, icon, source, amount, date, created_at
                     FROM income WHERE user_id = ?1
                     ORDER BY date DESC, id DESC",
                )?;
                let rows = stmt.query_map(params![user_id], income_from_row)?;
                for row in rows {
                    results.push(row?);
                }
            }
        }

        Ok(results)
    }

    /// Delete an income record owned by the user; true when a row was removed
    pub fn delete_income(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn.execute(
            "DELETE FROM income WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(category: Option<&str>, amount: f64, date: &str) -> NewExpense {
        NewExpense {
            icon: None,
            category: category.map(String::from),
            amount,
            date: date.parse().unwrap(),
        }
    }

    fn income(source: Option<&str>, amount: f64, date: &str) -> NewIncome {
        NewIncome {
            icon: None,
            source: source.map(String::from),
            amount,
            date: date.parse().unwrap(),
        }
    }

    #[test]
    fn insert_and_list_expenses() {
        let db = Database::in_memory().unwrap();
        db.insert_expense(1, &expense(Some("Food"), 120.0, "2025-05-10")).unwrap();
        db.insert_expense(1, &expense(Some("Rent"), 900.0, "2025-05-01")).unwrap();
        db.insert_expense(2, &expense(Some("Food"), 50.0, "2025-05-10")).unwrap();

        let all = db.list_expenses(1, None).unwrap();
        assert_eq!(all.len(), 2);
        // newest first
        assert_eq!(all[0].category.as_deref(), Some("Food"));
    }

    #[test]
    fn range_filter_is_inclusive_and_scoped() {
        let db = Database::in_memory().unwrap();
        db.insert_expense(1, &expense(None, 10.0, "2025-04-30")).unwrap();
        db.insert_expense(1, &expense(None, 20.0, "2025-05-01")).unwrap();
        db.insert_expense(1, &expense(None, 30.0, "2025-05-31")).unwrap();
        db.insert_expense(1, &expense(None, 40.0, "2025-06-01")).unwrap();

        let range = Some((
            "2025-05-01".parse().unwrap(),
            "2025-05-31".parse().unwrap(),
        ));
        let may = db.list_expenses(1, range).unwrap();
        assert_eq!(may.len(), 2);
        assert!(db.list_expenses(2, range).unwrap().is_empty());
    }

    #[test]
    fn missing_amount_reads_as_zero() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        conn.execute(
            "INSERT INTO expenses (user_id, category, amount, date) VALUES (1, 'Misc', NULL, '2025-05-10')",
            [],
        )
        .unwrap();
        drop(conn);

        let rows = db.list_expenses(1, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 0.0);
    }

    #[test]
    fn delete_respects_ownership() {
        let db = Database::in_memory().unwrap();
        let inc = db.insert_income(1, &income(Some("Salary"), 3000.0, "2025-05-01")).unwrap();

        assert!(!db.delete_income(2, inc.id).unwrap());
        assert!(db.delete_income(1, inc.id).unwrap());
        assert!(db.list_income(1, None).unwrap().is_empty());
    }
}
