use crate::database::format::{format_row, format_value};
use crate::database::Database;
use rusqlite::Batch;
use serde::Serialize;
use std::fmt;

const MULTIPLE_STATEMENTS_MESSAGE: &str = "You can only execute one statement at a time.";

/// result of running generated sql
///
/// failures are values, not errors: they flow on to summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "lowercase")]
pub enum QueryOutcome {
    /// newline-joined rows, empty when the statement returned nothing
    Rows(String),
    /// the database's error message
    Failed(String),
}

impl QueryOutcome {
    pub const ERROR_PREFIX: &'static str = "Error: ";

    pub fn is_failure(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }

    /// text form handed to the summarizer and shown to users
    pub fn to_text(&self) -> String {
        match self {
            QueryOutcome::Rows(rows) => rows.clone(),
            QueryOutcome::Failed(message) => format!("{}{}", Self::ERROR_PREFIX, message),
        }
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl Database {
    /// run a statement and render its rows; never fails
    #[tracing::instrument(skip(self, sql), fields(sql_len = sql.len()))]
    pub fn run(&self, sql: &str) -> QueryOutcome {
        match self.query_rows(sql) {
            Ok(rows) => {
                tracing::debug!(result_len = rows.len(), "query succeeded");
                QueryOutcome::Rows(rows)
            }
            Err(rusqlite::Error::MultipleStatement) => {
                tracing::warn!("query rejected: more than one statement");
                QueryOutcome::Failed(MULTIPLE_STATEMENTS_MESSAGE.to_string())
            }
            Err(e) => {
                tracing::warn!("query failed: {}", e);
                QueryOutcome::Failed(e.to_string())
            }
        }
    }

    fn query_rows(&self, sql: &str) -> rusqlite::Result<String> {
        let conn = self.lock();
        let mut batch = Batch::new(&conn, sql);

        // empty and comment-only input is a no-op
        let Some(mut stmt) = batch.next()? else {
            return Ok(String::new());
        };

        // trailing whitespace and comments are fine, a second statement is not
        if batch.next()?.is_some() {
            return Err(rusqlite::Error::MultipleStatement);
        }

        let column_count = stmt.column_count();

        if column_count == 0 {
            stmt.execute([])?;
            return Ok(String::new());
        }

        let mut rows = stmt.query([])?;
        let mut lines = Vec::new();

        while let Some(row) = rows.next()? {
            let values = (0..column_count)
                .map(|idx| row.get_ref(idx).map(format_value))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            lines.push(format_row(&values));
        }

        Ok(lines.join("\n"))
    }
}
