//! Ledgerly Core Library
//!
//! Shared functionality for the Ledgerly personal finance advisor:
//! - SQLite ledger store (expenses/income) with connection pooling
//! - Free-text period resolution (ordered date-phrase rules)
//! - Ledger aggregation into period/all-time snapshots
//! - Prompt context formatting for the language model
//! - Pluggable completion backends (Gemini, mock)
//! - Advice orchestration with timeout and typed failure categories

pub mod advisor;
pub mod aggregate;
pub mod ai;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod period;

pub use advisor::{Advisor, AdvisorError, AdvicePrompt, DEFAULT_ADVICE_TIMEOUT, NO_DATA_SENTENCES};
pub use aggregate::aggregate;
pub use ai::{
    CompletionBackend, CompletionClient, CompletionError, CompletionOptions, GeminiBackend,
    MockBackend,
};
pub use context::{format_context, NO_RECORDS_MARKER};
pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    AdvisoryResponse, AggregateSnapshot, Expense, GroupTotal, Income, MonthlySummary, NewExpense,
    NewIncome, ResolvedPeriod, UserStats,
};
pub use period::resolve;
