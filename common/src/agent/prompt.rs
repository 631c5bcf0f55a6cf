use crate::llm::model::Message;

pub const SQL_SYSTEM_PROMPT: &str =
    "You are an expert in SQL. Write only the SQL query for the given question and schema.";

pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are an assistant. Given a user's question and the result of a SQL query, \
     write a concise natural language answer. \
     If the result contains an error, explain it clearly.";

pub fn build_sql_messages(question: &str, table_info: &str) -> Vec<Message> {
    let prompt = format!(
        "Tables:\n{}\n\nQuestion:\n{}\n\nSQL Query:",
        table_info, question
    );

    vec![Message::system(SQL_SYSTEM_PROMPT), Message::user(prompt)]
}

pub fn build_summary_messages(question: &str, query_result: &str) -> Vec<Message> {
    let prompt = format!(
        "Question:\n{}\n\nQuery Result:\n{}\n\nAnswer:",
        question, query_result
    );

    vec![Message::system(SUMMARY_SYSTEM_PROMPT), Message::user(prompt)]
}
