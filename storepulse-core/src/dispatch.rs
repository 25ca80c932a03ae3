//! Multi-modal query dispatcher
//!
//! Maps a user-selected query mode plus free text or a subject selection
//! into one backend call, formats the typed response, and recovers from
//! failure by falling back to the generic chat call. Exactly one
//! conversation turn is appended per accepted submission, no matter how
//! many underlying calls were attempted.

use crate::api::{AnalyticsBackend, AnomalyRecord, StockForecast, StockPerformance};
use crate::types::{ConversationTurn, Role};

/// Reply appended when both the mode call and the chat fallback fail.
pub const FALLBACK_APOLOGY: &str = "An error occurred. Please try again later.";

/// The kind of analytic query being asked.
///
/// Closed set; the dispatch site matches exhaustively so no mode can be
/// left unhandled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    Chatbot,
    Anomalies,
    Performance,
    Forecast,
    Risk,
}

impl QueryMode {
    /// Every mode except chatbot needs a resolved subject label before
    /// it can be submitted.
    pub fn requires_subject(&self) -> bool {
        !matches!(self, QueryMode::Chatbot)
    }

    /// The query surface a user lands on is decided by their role:
    /// finance users get the analytic chat; the other roles work from
    /// their recommendation panels and have no dispatcher at all.
    pub fn default_for(role: Option<Role>) -> Option<QueryMode> {
        match role {
            Some(Role::Finance) => Some(QueryMode::Chatbot),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Chatbot => "chatbot",
            QueryMode::Anomalies => "anomalies",
            QueryMode::Performance => "performance",
            QueryMode::Forecast => "forecast",
            QueryMode::Risk => "risk",
        }
    }
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request state of the dispatcher; one submission in flight at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchState {
    #[default]
    Idle,
    Submitting,
}

/// What a call to [`Dispatcher::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A turn was appended to the conversation
    Answered,
    /// Input did not resolve to a question; nothing happened
    Skipped,
    /// A prior submission is still in flight; nothing happened
    Busy,
}

/// Synthesize the displayed question for a mode.
///
/// Chatbot uses the trimmed raw input; subject modes embed the label in
/// a fixed template. Returns None when there is nothing to submit.
fn synthesize_question(mode: QueryMode, input: &str, subject: Option<&str>) -> Option<String> {
    match mode {
        QueryMode::Chatbot => {
            let question = input.trim();
            (!question.is_empty()).then(|| question.to_string())
        }
        QueryMode::Anomalies => subject.map(|s| format!("What are the anomalies for {}?", s)),
        QueryMode::Performance => subject.map(|s| format!("What is the performance of {}?", s)),
        QueryMode::Forecast => subject.map(|s| format!("What is the forecast for {}?", s)),
        QueryMode::Risk => subject.map(|s| format!("What is the risk for {}?", s)),
    }
}

/// Format a list of anomalies into the reply text.
pub fn format_anomalies(anomalies: &[AnomalyRecord]) -> String {
    if anomalies.is_empty() {
        return "No anomalies detected for this stock.".to_string();
    }

    anomalies
        .iter()
        .enumerate()
        .map(|(i, a)| {
            format!(
                "Anomaly {}:\n- Date: {}\n- Price: {:.4}\n- Volume: {:.4}\n- Reason: {}",
                i + 1,
                a.se_date.value.format("%Y-%m-%d"),
                a.last_price,
                a.trading_volume,
                a.reason
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format performance metrics into the reply text.
pub fn format_performance(perf: &StockPerformance) -> String {
    format!(
        "Stock Performance:\n- Average Return: {:.2}\n- Volatility: {:.2}\n- Trend: {}",
        perf.average_return, perf.volatility, perf.trend
    )
}

/// Format a forecast into the reply text.
pub fn format_forecast(forecast: &StockForecast) -> String {
    format!(
        "7-Day Forecast:\n- Predicted Change: {:.2}%\n- Confidence: {:.2}%",
        forecast.predicted_change, forecast.confidence
    )
}

/// Format a value-at-risk figure into the reply text.
pub fn format_risk(var_1day_95pct: f64) -> String {
    format!("1-Day Value at Risk (95%): {:.2}", var_1day_95pct)
}

/// Dispatches one query at a time and owns the conversation history.
pub struct Dispatcher<B: AnalyticsBackend> {
    backend: B,
    state: DispatchState,
    input: String,
    turns: Vec<ConversationTurn>,
}

impl<B: AnalyticsBackend> Dispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: DispatchState::default(),
            input: String::new(),
            turns: Vec::new(),
        }
    }

    /// The pending free-text input (used by chatbot mode).
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the pending free-text input.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Conversation history, in submission order.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Submit the pending input (chatbot) or the subject selection
    /// (analytic modes) as one query.
    ///
    /// Blank input or an unresolved subject is a no-op. Failures never
    /// reach the history as errors: the chat fallback is tried with the
    /// same synthesized question, and a double failure appends the fixed
    /// apology. On every terminal outcome the input is cleared and the
    /// dispatcher returns to idle.
    pub async fn submit(&mut self, mode: QueryMode, subject: Option<&str>) -> SubmitOutcome {
        if self.state == DispatchState::Submitting {
            tracing::debug!(%mode, "Rejecting submit: one already in flight");
            return SubmitOutcome::Busy;
        }

        let subject = subject.map(str::trim).filter(|s| !s.is_empty());
        let Some(question) = synthesize_question(mode, &self.input, subject) else {
            return SubmitOutcome::Skipped;
        };

        self.state = DispatchState::Submitting;

        let response = match self.issue(mode, &question, subject).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(%mode, error = %e, "Query failed, falling back to chat");
                self.fallback(&question).await
            }
        };

        self.turns.push(ConversationTurn { question, response });
        self.input.clear();
        self.state = DispatchState::Idle;

        SubmitOutcome::Answered
    }

    /// Issue the mode's backend call and format the typed response.
    async fn issue(
        &self,
        mode: QueryMode,
        question: &str,
        subject: Option<&str>,
    ) -> crate::error::Result<String> {
        // synthesize_question() already rejected subject modes without a
        // label, so the empty fallback below is unreachable in practice.
        let stock = subject.unwrap_or_default();

        match mode {
            QueryMode::Chatbot => self.backend.chat(question).await,
            QueryMode::Anomalies => {
                let anomalies = self.backend.anomalies(stock).await?;
                Ok(format_anomalies(&anomalies))
            }
            QueryMode::Performance => {
                let perf = self.backend.performance(stock).await?;
                Ok(format_performance(&perf))
            }
            QueryMode::Forecast => {
                let forecast = self.backend.forecast(stock).await?;
                Ok(format_forecast(&forecast))
            }
            QueryMode::Risk => {
                let var = self.backend.risk(stock).await?;
                Ok(format_risk(var))
            }
        }
    }

    /// Re-issue the question through the chat endpoint; a second failure
    /// yields the fixed apology.
    async fn fallback(&self, question: &str) -> String {
        match self.backend.chat(question).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Chat fallback also failed");
                FALLBACK_APOLOGY.to_string()
            }
        }
    }

    #[cfg(test)]
    fn force_submitting(&mut self) {
        self.state = DispatchState::Submitting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::MongoDate;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// Scriptable backend that records every call it receives.
    #[derive(Default)]
    struct FakeBackend {
        chat_reply: Option<String>,
        anomalies: Option<Vec<AnomalyRecord>>,
        performance: Option<StockPerformance>,
        forecast: Option<StockForecast>,
        risk: Option<f64>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnalyticsBackend for FakeBackend {
        async fn chat(&self, prompt: &str) -> Result<String> {
            self.record(format!("chat:{}", prompt));
            self.chat_reply
                .clone()
                .ok_or_else(|| Error::Api("chat down".to_string()))
        }

        async fn anomalies(&self, stock: &str) -> Result<Vec<AnomalyRecord>> {
            self.record(format!("anomalies:{}", stock));
            self.anomalies
                .clone()
                .ok_or_else(|| Error::Api("anomalies down".to_string()))
        }

        async fn performance(&self, stock: &str) -> Result<StockPerformance> {
            self.record(format!("performance:{}", stock));
            self.performance
                .clone()
                .ok_or_else(|| Error::Api("performance down".to_string()))
        }

        async fn forecast(&self, stock: &str) -> Result<StockForecast> {
            self.record(format!("forecast:{}", stock));
            self.forecast
                .ok_or_else(|| Error::Api("forecast down".to_string()))
        }

        async fn risk(&self, stock: &str) -> Result<f64> {
            self.record(format!("risk:{}", stock));
            self.risk.ok_or_else(|| Error::Api("risk down".to_string()))
        }
    }

    fn anomaly(price: f64, volume: f64, reason: &str) -> AnomalyRecord {
        AnomalyRecord {
            se_date: MongoDate {
                value: chrono::Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap(),
            },
            last_price: price,
            trading_volume: volume,
            reason: reason.to_string(),
        }
    }

    #[tokio::test]
    async fn test_blank_chatbot_input_is_a_no_op() {
        let mut dispatcher = Dispatcher::new(FakeBackend::default());
        dispatcher.set_input("   ");

        let outcome = dispatcher.submit(QueryMode::Chatbot, None).await;

        assert_eq!(outcome, SubmitOutcome::Skipped);
        assert!(dispatcher.turns().is_empty());
        assert_eq!(dispatcher.state(), DispatchState::Idle);
    }

    #[tokio::test]
    async fn test_subject_mode_without_label_is_a_no_op() {
        let mut dispatcher = Dispatcher::new(FakeBackend::default());
        dispatcher.set_input("ignored");

        assert_eq!(
            dispatcher.submit(QueryMode::Anomalies, None).await,
            SubmitOutcome::Skipped
        );
        assert_eq!(
            dispatcher.submit(QueryMode::Risk, Some("   ")).await,
            SubmitOutcome::Skipped
        );
        assert!(dispatcher.turns().is_empty());
    }

    #[tokio::test]
    async fn test_chatbot_reply_is_verbatim_and_input_cleared() {
        let backend = FakeBackend {
            chat_reply: Some("Hold the position.".to_string()),
            ..Default::default()
        };
        let mut dispatcher = Dispatcher::new(backend);
        dispatcher.set_input("Should I sell ACME?");

        let outcome = dispatcher.submit(QueryMode::Chatbot, None).await;

        assert_eq!(outcome, SubmitOutcome::Answered);
        assert_eq!(dispatcher.turns().len(), 1);
        assert_eq!(dispatcher.turns()[0].question, "Should I sell ACME?");
        assert_eq!(dispatcher.turns()[0].response, "Hold the position.");
        assert_eq!(dispatcher.input(), "");
        assert_eq!(dispatcher.state(), DispatchState::Idle);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_to_chat_with_synthesized_question() {
        let backend = FakeBackend {
            chat_reply: Some("Nothing unusual lately.".to_string()),
            anomalies: None, // primary call fails
            ..Default::default()
        };
        let mut dispatcher = Dispatcher::new(backend);

        let outcome = dispatcher.submit(QueryMode::Anomalies, Some("ACME")).await;

        assert_eq!(outcome, SubmitOutcome::Answered);
        assert_eq!(dispatcher.turns().len(), 1);
        assert_eq!(
            dispatcher.turns()[0].question,
            "What are the anomalies for ACME?"
        );
        assert_eq!(dispatcher.turns()[0].response, "Nothing unusual lately.");
        assert_eq!(
            dispatcher.backend.calls(),
            vec![
                "anomalies:ACME".to_string(),
                "chat:What are the anomalies for ACME?".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_double_failure_appends_apology() {
        let mut dispatcher = Dispatcher::new(FakeBackend::default());

        let outcome = dispatcher.submit(QueryMode::Risk, Some("ACME")).await;

        assert_eq!(outcome, SubmitOutcome::Answered);
        assert_eq!(dispatcher.turns().len(), 1);
        assert_eq!(dispatcher.turns()[0].response, FALLBACK_APOLOGY);
    }

    #[tokio::test]
    async fn test_empty_anomaly_list_formats_fixed_sentence() {
        let backend = FakeBackend {
            anomalies: Some(vec![]),
            ..Default::default()
        };
        let mut dispatcher = Dispatcher::new(backend);

        dispatcher.submit(QueryMode::Anomalies, Some("ACME")).await;

        assert_eq!(
            dispatcher.turns()[0].response,
            "No anomalies detected for this stock."
        );
    }

    #[tokio::test]
    async fn test_busy_dispatcher_rejects_submit() {
        let mut dispatcher = Dispatcher::new(FakeBackend::default());
        dispatcher.set_input("hello");
        dispatcher.force_submitting();

        assert_eq!(
            dispatcher.submit(QueryMode::Chatbot, None).await,
            SubmitOutcome::Busy
        );
        assert!(dispatcher.turns().is_empty());
        // The pending input is untouched by a rejected submit.
        assert_eq!(dispatcher.input(), "hello");
    }

    #[test]
    fn test_question_templates() {
        assert_eq!(
            synthesize_question(QueryMode::Performance, "", Some("ACME")),
            Some("What is the performance of ACME?".to_string())
        );
        assert_eq!(
            synthesize_question(QueryMode::Forecast, "", Some("ACME")),
            Some("What is the forecast for ACME?".to_string())
        );
        assert_eq!(
            synthesize_question(QueryMode::Risk, "", Some("ACME")),
            Some("What is the risk for ACME?".to_string())
        );
        assert_eq!(
            synthesize_question(QueryMode::Chatbot, "  trimmed  ", None),
            Some("trimmed".to_string())
        );
    }

    #[test]
    fn test_format_anomalies_blocks() {
        let anomalies = vec![
            anomaly(104.2312, 182332.5, "Volume spike"),
            anomaly(98.5, 1000.0, "Price drop"),
        ];
        let text = format_anomalies(&anomalies);

        assert!(text.starts_with("Anomaly 1:\n- Date: 2024-03-11\n- Price: 104.2312"));
        assert!(text.contains("\n\nAnomaly 2:"));
        assert!(text.contains("- Volume: 1000.0000"));
        assert!(text.ends_with("- Reason: Price drop"));
    }

    #[test]
    fn test_format_performance_and_forecast_and_risk() {
        let perf = StockPerformance {
            average_return: 0.125,
            volatility: 1.567,
            trend: "Upward".to_string(),
        };
        assert_eq!(
            format_performance(&perf),
            "Stock Performance:\n- Average Return: 0.13\n- Volatility: 1.57\n- Trend: Upward"
        );

        let forecast = StockForecast {
            predicted_change: -2.345,
            confidence: 88.2,
        };
        assert_eq!(
            format_forecast(&forecast),
            "7-Day Forecast:\n- Predicted Change: -2.35%\n- Confidence: 88.20%"
        );

        assert_eq!(format_risk(-1.234), "1-Day Value at Risk (95%): -1.23");
    }

    #[test]
    fn test_default_mode_by_role() {
        assert_eq!(
            QueryMode::default_for(Some(Role::Finance)),
            Some(QueryMode::Chatbot)
        );
        assert_eq!(QueryMode::default_for(Some(Role::Sales)), None);
        assert_eq!(QueryMode::default_for(None), None);
    }
}
