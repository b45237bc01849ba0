//! Expense and income handlers
//!
//! The data-entry endpoints the browser client uses to record transactions.
//! All reads/writes are scoped to the authenticated user.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use ledgerly_core::models::{Expense, Income, NewExpense, NewIncome};

use crate::{AppError, AppState, AuthUser, SuccessResponse};

/// GET /api/expenses - List the user's expenses, newest first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Expense>>, AppError> {
    Ok(Json(state.db.list_expenses(user.0, None)?))
}

/// POST /api/expenses - Record an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new): Json<NewExpense>,
) -> Result<Json<Expense>, AppError> {
    if !new.amount.is_finite() || new.amount < 0.0 {
        return Err(AppError::bad_request("Amount must be a non-negative number"));
    }
    Ok(Json(state.db.insert_expense(user.0, &new)?))
}

/// DELETE /api/expenses/:id - Remove an expense owned by the user
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_expense(user.0, id)? {
        return Err(AppError::not_found("Expense not found"));
    }
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/income - List the user's income records, newest first
pub async fn list_income(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Income>>, AppError> {
    Ok(Json(state.db.list_income(user.0, None)?))
}

/// POST /api/income - Record income
pub async fn create_income(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new): Json<NewIncome>,
) -> Result<Json<Income>, AppError> {
    if !new.amount.is_finite() || new.amount < 0.0 {
        return Err(AppError::bad_request("Amount must be a non-negative number"));
    }
    Ok(Json(state.db.insert_income(user.0, &new)?))
}

/// DELETE /api/income/:id - Remove an income record owned by the user
pub async fn delete_income(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_income(user.0, id)? {
        return Err(AppError::not_found("Income record not found"));
    }
    Ok(Json(SuccessResponse { success: true }))
}
