use crate::agent::parser::extract_sql;
use crate::agent::prompt::{build_sql_messages, build_summary_messages};
use crate::database::QueryOutcome;
use crate::error::Result;
use crate::llm::model::LanguageModel;

pub const EXECUTION_ERROR_PREAMBLE: &str = "There was an error executing the SQL query: ";

/// ask the model for a query answering `question` and extract the statement
#[tracing::instrument(skip(model, question, table_info), fields(llm.model = %model.name(), table_info_len = table_info.len()))]
pub async fn generate_sql(
    model: &dyn LanguageModel,
    question: &str,
    table_info: &str,
) -> Result<String> {
    let messages = build_sql_messages(question, table_info);
    let raw_output = model.generate(messages).await?;

    tracing::debug!(raw_len = raw_output.len(), "sql completion received");

    let sql = extract_sql(&raw_output);
    tracing::info!(sql = %sql, "sql extracted");
    Ok(sql)
}

/// turn a query outcome into an answer for the user
///
/// failed queries are explained without calling the model.
#[tracing::instrument(skip(model, question, outcome), fields(llm.model = %model.name(), failed = outcome.is_failure()))]
pub async fn summarize(
    model: &dyn LanguageModel,
    question: &str,
    outcome: &QueryOutcome,
) -> Result<String> {
    if outcome.is_failure() {
        tracing::info!("query failed, skipping model summary");
        return Ok(format!("{}{}", EXECUTION_ERROR_PREAMBLE, outcome.to_text()));
    }

    let messages = build_summary_messages(question, &outcome.to_text());
    let summary = model.generate(messages).await?;

    Ok(summary.trim().to_string())
}
