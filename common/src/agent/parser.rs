use once_cell::sync::Lazy;
use regex::Regex;

static SQL_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```sql\s*(.*?)```").unwrap()
});

/// pull a single sql statement out of raw model output
///
/// a fenced block tagged `sql` wins and its trimmed interior is returned
/// as is. without one, everything before the first `;` is kept and a
/// terminator is appended, so the result always ends with `;` on that path.
pub fn extract_sql(raw_output: &str) -> String {
    if let Some(body) = SQL_FENCE_REGEX
        .captures(raw_output)
        .and_then(|captures| captures.get(1))
    {
        return body.as_str().trim().to_string();
    }

    let head = raw_output.split(';').next().unwrap_or_default();
    format!("{};", head.trim())
}
