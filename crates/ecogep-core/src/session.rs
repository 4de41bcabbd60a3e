//! Per-user interactive session state

use uuid::Uuid;

use crate::models::{ConversationHistory, ValuationReport};

/// Everything one interactive session carries between operations.
///
/// Starts with no report and an empty history. The history is reset by
/// [`SessionContext::clear_conversation`] and by
/// [`SessionContext::begin_generation`]; the report only changes through
/// `begin_generation` (cleared) and [`SessionContext::commit_report`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    id: Uuid,
    report: Option<ValuationReport>,
    history: ConversationHistory,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            report: None,
            history: ConversationHistory::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn report(&self) -> Option<&ValuationReport> {
        self.report.as_ref()
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ConversationHistory {
        &mut self.history
    }

    /// Start of a report-generation attempt: drops the previous report and
    /// the whole conversation, whatever the outcome of the attempt.
    pub fn begin_generation(&mut self) {
        tracing::debug!(session = %self.id, "Clearing report and conversation for new generation");
        self.report = None;
        self.history.clear();
    }

    /// Install a fully parsed report
    pub fn commit_report(&mut self, report: ValuationReport) -> &ValuationReport {
        self.report.insert(report)
    }

    /// Explicit user-triggered clear; the report stays
    pub fn clear_conversation(&mut self) {
        self.history.clear();
    }

    /// Serialized report for follow-up prompts
    pub fn report_context(&self) -> Option<String> {
        self.report.as_ref().map(ValuationReport::context_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_session_is_empty() {
        let session = SessionContext::new();
        assert!(session.report().is_none());
        assert!(session.history().is_empty());
        assert!(session.report_context().is_none());
    }

    #[test]
    fn test_begin_generation_resets_everything() {
        let mut session = SessionContext::new();
        session.commit_report(ValuationReport::from_value(json!({"total_value": 1})));
        session.history_mut().push_user("q");
        session.history_mut().push_assistant("a");

        session.begin_generation();

        assert!(session.report().is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_clear_conversation_keeps_report() {
        let mut session = SessionContext::new();
        session.commit_report(ValuationReport::from_value(json!({"total_value": 1})));
        session.history_mut().push_user("q");

        session.clear_conversation();

        assert!(session.report().is_some());
        assert!(session.history().is_empty());
        assert_eq!(session.report_context().unwrap(), r#"{"total_value":1}"#);
    }
}
