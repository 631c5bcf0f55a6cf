use crate::database::QueryOutcome;
use crate::error::{AskDbError, Result};
use serde::Serialize;

/// progress marker, advanced by exactly one step per stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Start,
    SqlGenerated,
    Executed,
    Summarized,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Start => "start",
            PipelineStep::SqlGenerated => "sql_generated",
            PipelineStep::Executed => "executed",
            PipelineStep::Summarized => "summarized",
        }
    }
}

/// record threaded through every stage of one run
///
/// stages take the whole state and hand the whole state back, touching only
/// their own fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineState {
    pub question: String,
    pub sql: Option<String>,
    pub query_result: Option<QueryOutcome>,
    pub summary: Option<String>,
    pub step: PipelineStep,
}

impl PipelineState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            sql: None,
            query_result: None,
            summary: None,
            step: PipelineStep::Start,
        }
    }

    pub fn expect_step(&self, expected: PipelineStep) -> Result<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(AskDbError::Pipeline(format!(
                "expected state at step '{}', found '{}'",
                expected.as_str(),
                self.step.as_str()
            )))
        }
    }

    pub fn sql(&self) -> Result<&str> {
        self.sql
            .as_deref()
            .ok_or_else(|| AskDbError::Pipeline("no sql generated yet".to_string()))
    }

    pub fn query_result(&self) -> Result<&QueryOutcome> {
        self.query_result
            .as_ref()
            .ok_or_else(|| AskDbError::Pipeline("query has not been executed yet".to_string()))
    }

    pub fn summary(&self) -> Result<&str> {
        self.summary
            .as_deref()
            .ok_or_else(|| AskDbError::Pipeline("no summary produced yet".to_string()))
    }

    pub fn with_sql(self, sql: String) -> Self {
        Self {
            sql: Some(sql),
            step: PipelineStep::SqlGenerated,
            ..self
        }
    }

    pub fn with_query_result(self, outcome: QueryOutcome) -> Self {
        Self {
            query_result: Some(outcome),
            step: PipelineStep::Executed,
            ..self
        }
    }

    pub fn with_summary(self, summary: String) -> Self {
        Self {
            summary: Some(summary),
            step: PipelineStep::Summarized,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_carry_forward() {
        let state = PipelineState::new("How many departments are there?")
            .with_sql("SELECT COUNT(*) FROM departments;".to_string())
            .with_query_result(QueryOutcome::Rows("(3,)".to_string()))
            .with_summary("There are 3 departments.".to_string());

        assert_eq!(state.step, PipelineStep::Summarized);
        assert_eq!(state.question, "How many departments are there?");
        assert_eq!(state.sql().unwrap(), "SELECT COUNT(*) FROM departments;");
        assert_eq!(state.query_result().unwrap().to_text(), "(3,)");
        assert_eq!(state.summary().unwrap(), "There are 3 departments.");
    }

    #[test]
    fn test_expect_step() {
        let state = PipelineState::new("q");
        assert!(state.expect_step(PipelineStep::Start).is_ok());

        let err = state.expect_step(PipelineStep::Executed).unwrap_err();
        assert_eq!(
            err.to_string(),
            "pipeline error: expected state at step 'executed', found 'start'"
        );
    }

    #[test]
    fn test_missing_fields_are_errors() {
        let state = PipelineState::new("q");
        assert!(state.sql().is_err());
        assert!(state.query_result().is_err());
        assert!(state.summary().is_err());
    }
}
