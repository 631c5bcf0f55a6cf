pub mod prompt;
pub mod parser;
pub mod executor;

pub use prompt::{build_sql_messages, build_summary_messages, SQL_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT};
pub use parser::extract_sql;
pub use executor::{generate_sql, summarize, EXECUTION_ERROR_PREAMBLE};
