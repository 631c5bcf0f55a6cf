use crate::database::format::format_cell;
use crate::database::Database;
use crate::error::Result;
use rusqlite::Connection;

const TABLES_QUERY: &str = "SELECT name, sql FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
     ORDER BY name";

impl Database {
    /// user tables, sorted by name
    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(TABLES_QUERY)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// describe every user table for prompting
    ///
    /// each table contributes its `CREATE TABLE` statement followed by a
    /// comment block with a few sample rows.
    #[tracing::instrument(skip(self), fields(sample_rows = self.config.sample_rows))]
    pub fn table_info(&self) -> Result<String> {
        let conn = self.lock();

        let tables = {
            let mut stmt = conn.prepare(TABLES_QUERY)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut sections = Vec::with_capacity(tables.len());
        for (name, ddl) in tables {
            let mut section = ddl.unwrap_or_default().trim().to_string();

            if self.config.sample_rows > 0 {
                section.push_str("\n\n");
                section.push_str(&sample_rows(&conn, &name, self.config.sample_rows)?);
            }

            sections.push(section);
        }

        tracing::debug!(tables = sections.len(), "schema described");
        Ok(sections.join("\n\n"))
    }
}

fn sample_rows(conn: &Connection, table: &str, limit: usize) -> Result<String> {
    let sql = format!("SELECT * FROM {} LIMIT {}", quote_identifier(table), limit);
    let mut stmt = conn.prepare(&sql)?;

    let header = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>()
        .join("\t");
    let column_count = stmt.column_count();

    let mut lines = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let cells = (0..column_count)
            .map(|idx| row.get_ref(idx).map(format_cell))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        lines.push(cells.join("\t"));
    }

    let mut block = format!("/*\n{} rows from {} table:\n{}", limit, table, header);
    for line in lines {
        block.push('\n');
        block.push_str(&line);
    }
    block.push_str("\n*/");
    Ok(block)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
