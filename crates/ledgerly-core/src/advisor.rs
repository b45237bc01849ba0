//! Advice orchestration
//!
//! Ties the pipeline together: resolve the period from the question,
//! aggregate the ledger, format the context, call the completion service
//! under a timeout, and map provider failures to the user-facing error
//! taxonomy. One request, no shared state, no retries.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ai::{CompletionBackend, CompletionClient, CompletionError, CompletionOptions};
use crate::aggregate::aggregate;
use crate::context::{format_context, NO_RECORDS_MARKER};
use crate::db::Database;
use crate::error::Error;
use crate::models::{AdvisoryResponse, UserStats};
use crate::period::resolve;

/// Default bound on the completion call
pub const DEFAULT_ADVICE_TIMEOUT: Duration = Duration::from_secs(25);

/// Openings the advisor uses when the requested period has no records.
/// The prompt rules require the model to pick one of these; the
/// orchestrator itself uses the first when it can answer without the model.
pub const NO_DATA_SENTENCES: &[&str] = &[
    "No records found for",
    "There are no transactions recorded for",
];

/// User-facing advisor failure categories
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Question is required")]
    Validation,

    #[error("Advisor API key is not configured. Set GEMINI_API_KEY on the server.")]
    Configuration,

    #[error("Too many requests. Wait a moment and retry.")]
    RateLimit,

    #[error("Request took too long. Please try again.")]
    Timeout,

    /// Any other provider failure; the detail is kept for diagnostics but
    /// never shown in the user-facing message
    #[error("Error generating financial advice")]
    Upstream(String),

    /// Infrastructure failure (database, pool, IO); the message stays
    /// generic, the underlying error is kept for diagnostics
    #[error("An internal error occurred")]
    Internal(#[from] Error),
}

impl AdvisorError {
    /// Provider/internal detail for non-production diagnostics
    pub fn detail(&self) -> Option<String> {
        match self {
            AdvisorError::Upstream(detail) => Some(detail.clone()),
            AdvisorError::Internal(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

impl From<CompletionError> for AdvisorError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Credential => AdvisorError::Configuration,
            CompletionError::Quota => AdvisorError::RateLimit,
            CompletionError::Timeout => AdvisorError::Timeout,
            CompletionError::Transport(detail) => AdvisorError::Upstream(detail),
        }
    }
}

/// Prompt for one advice request, rules and data kept separate until the
/// provider boundary
#[derive(Debug)]
pub struct AdvicePrompt {
    pub rules: String,
    pub context: String,
    pub question: String,
}

impl AdvicePrompt {
    pub fn new(context: String, question: &str) -> Self {
        Self {
            rules: advice_rules(),
            context,
            question: question.to_string(),
        }
    }

    /// Concatenate into the single prompt string sent to the provider
    pub fn render(&self) -> String {
        format!(
            "{}\n\nFINANCIAL DATA:\n{}\nQuestion: \"{}\"\n\nProvide 2-3 specific, actionable financial tips based on this data:",
            self.rules, self.context, self.question
        )
    }
}

/// The strict usage rules embedded in every prompt
fn advice_rules() -> String {
    format!(
        "You are a financial advisor. Answer directly and concisely.\n\
         \n\
         RULES:\n\
         - Use ONLY the financial data below; never invent figures\n\
         - If the data contains the line \"{marker}\", your reply must begin with \
           one of: \"{first} <period>.\" / \"{second} <period>.\" and must not offer advice\n\
         - Never substitute all-time figures for a period question unless the \
           question explicitly asks for all-time totals\n\
         - Use **bold** only for figures copied verbatim from the data\n\
         - Maximum 3 key points, keep the reply under 150 words\n\
         - Use emoji sparingly (max 2)",
        marker = NO_RECORDS_MARKER,
        first = NO_DATA_SENTENCES[0],
        second = NO_DATA_SENTENCES[1],
    )
}

/// The advisor request pipeline
#[derive(Clone)]
pub struct Advisor {
    db: Database,
    client: Option<CompletionClient>,
    timeout: Duration,
    options: CompletionOptions,
}

impl Advisor {
    pub fn new(db: Database, client: Option<CompletionClient>) -> Self {
        Self {
            db,
            client,
            timeout: DEFAULT_ADVICE_TIMEOUT,
            options: CompletionOptions::default(),
        }
    }

    /// Override the completion timeout (for tests)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Answer a financial question for a verified user
    pub async fn get_advice(
        &self,
        user_id: i64,
        question: &str,
    ) -> Result<AdvisoryResponse, AdvisorError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AdvisorError::Validation);
        }

        let period = resolve(question, Utc::now());
        info!(user_id, period = %period.label, "Advisor request");

        let snapshot = aggregate(&self.db, user_id, &period).await?;
        let stats = UserStats::from(&snapshot);

        // Nothing recorded in the window: answer without burning a provider
        // call, using the fixed opening the prompt rules mandate
        if snapshot.period_is_empty() {
            debug!(user_id, period = %period.label, "No records in period, skipping provider");
            return Ok(AdvisoryResponse {
                advice: format!(
                    "{} {}. Try a different time period, or add some transactions first.",
                    NO_DATA_SENTENCES[0], period.label
                ),
                period: period.label,
                stats,
            });
        }

        let client = self.client.as_ref().ok_or(AdvisorError::Configuration)?;

        let prompt = AdvicePrompt::new(format_context(&snapshot, &period), question);
        let rendered = prompt.render();
        debug!(chars = rendered.len(), model = client.model(), "Calling completion service");

        let completion = match tokio::time::timeout(
            self.timeout,
            client.complete(&rendered, &self.options),
        )
        .await
        {
            Ok(result) => result?,
            Err(_elapsed) => {
                warn!(user_id, timeout_secs = self.timeout.as_secs(), "Completion call timed out");
                return Err(AdvisorError::Timeout);
            }
        };

        Ok(AdvisoryResponse {
            advice: completion.trim().to_string(),
            period: period.label,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::NewExpense;

    fn db_with_recent_expense() -> Database {
        let db = Database::in_memory().unwrap();
        db.insert_expense(
            1,
            &NewExpense {
                icon: None,
                category: Some("Food".to_string()),
                amount: 250.0,
                date: Utc::now().date_naive(),
            },
        )
        .unwrap();
        db
    }

    fn advisor_with(db: Database, backend: MockBackend) -> Advisor {
        Advisor::new(db, Some(CompletionClient::Mock(backend)))
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let advisor = advisor_with(Database::in_memory().unwrap(), MockBackend::new());
        for q in ["", "   ", "\n\t"] {
            assert!(matches!(
                advisor.get_advice(1, q).await,
                Err(AdvisorError::Validation)
            ));
        }
    }

    #[tokio::test]
    async fn missing_client_is_a_configuration_error() {
        let advisor = Advisor::new(db_with_recent_expense(), None);
        assert!(matches!(
            advisor.get_advice(1, "how am I doing this month?").await,
            Err(AdvisorError::Configuration)
        ));
    }

    #[tokio::test]
    async fn successful_advice_carries_period_and_stats() {
        let advisor = advisor_with(
            db_with_recent_expense(),
            MockBackend::with_reply("  Spend less on Food.  "),
        );
        let response = advisor
            .get_advice(1, "how is this month going?")
            .await
            .unwrap();

        assert_eq!(response.advice, "Spend less on Food.");
        assert_eq!(response.period, "This Month");
        assert_eq!(response.stats.period_expenses, 250.0);
        assert_eq!(response.stats.expenses_by_category[0].name, "Food");
    }

    #[tokio::test]
    async fn empty_period_short_circuits_with_no_data_sentence() {
        // Data exists, but not in the requested window
        let db = Database::in_memory().unwrap();
        db.insert_expense(
            1,
            &NewExpense {
                icon: None,
                category: Some("Food".to_string()),
                amount: 100.0,
                date: "2020-01-15".parse().unwrap(),
            },
        )
        .unwrap();

        // A failing mock proves the provider is never called
        let advisor = advisor_with(db, MockBackend::with_failure(CompletionError::Quota));
        let response = advisor.get_advice(1, "spending this month").await.unwrap();

        assert!(response.advice.starts_with(NO_DATA_SENTENCES[0]));
        assert!(response.advice.contains("This Month"));
        assert_eq!(response.stats.period_expenses, 0.0);
        // All-time figures still reported
        assert_eq!(response.stats.total_expenses, 100.0);
    }

    #[tokio::test]
    async fn provider_failures_map_to_categories() {
        let cases = [
            (CompletionError::Credential, "Configuration"),
            (CompletionError::Quota, "RateLimit"),
            (CompletionError::Timeout, "Timeout"),
            (
                CompletionError::Transport("boom".to_string()),
                "Upstream",
            ),
        ];
        for (failure, expected) in cases {
            let advisor =
                advisor_with(db_with_recent_expense(), MockBackend::with_failure(failure));
            let err = advisor
                .get_advice(1, "this month")
                .await
                .expect_err("should fail");
            let got = match err {
                AdvisorError::Configuration => "Configuration",
                AdvisorError::RateLimit => "RateLimit",
                AdvisorError::Timeout => "Timeout",
                AdvisorError::Upstream(_) => "Upstream",
                other => panic!("unexpected error {:?}", other),
            };
            assert_eq!(got, expected);
        }
    }

    #[tokio::test]
    async fn upstream_detail_is_preserved_for_diagnostics() {
        let advisor = advisor_with(
            db_with_recent_expense(),
            MockBackend::with_failure(CompletionError::Transport("HTTP 502".to_string())),
        );
        let err = advisor.get_advice(1, "this month").await.unwrap_err();
        assert_eq!(err.detail().as_deref(), Some("HTTP 502"));
        // Fixed message does not leak the detail
        assert_eq!(err.to_string(), "Error generating financial advice");
    }

    #[test]
    fn internal_errors_keep_a_generic_message() {
        let err = AdvisorError::Internal(Error::InvalidData("bad row".to_string()));
        assert_eq!(err.to_string(), "An internal error occurred");
        assert_eq!(err.detail().as_deref(), Some("Invalid data: bad row"));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let advisor = advisor_with(
            db_with_recent_expense(),
            MockBackend::with_delay(Duration::from_secs(5)),
        )
        .with_timeout(Duration::from_millis(50));

        let err = advisor.get_advice(1, "this month").await.unwrap_err();
        assert!(matches!(err, AdvisorError::Timeout));
    }

    #[test]
    fn prompt_rules_reference_the_sentinel_and_openings() {
        let rules = advice_rules();
        assert!(rules.contains(NO_RECORDS_MARKER));
        for opening in NO_DATA_SENTENCES {
            assert!(rules.contains(opening));
        }
        assert!(rules.contains("all-time"));
    }

    #[test]
    fn prompt_renders_rules_before_data_before_question() {
        let prompt = AdvicePrompt::new("CONTEXT BLOCK".to_string(), "am I ok?");
        let rendered = prompt.render();
        let rules_at = rendered.find("RULES:").unwrap();
        let data_at = rendered.find("FINANCIAL DATA:").unwrap();
        let question_at = rendered.find("Question: \"am I ok?\"").unwrap();
        assert!(rules_at < data_at && data_at < question_at);
    }
}
