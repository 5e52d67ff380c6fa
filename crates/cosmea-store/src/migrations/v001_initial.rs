use rusqlite::Connection;

const UP_SQL: &str = r#"
-- One row per document; the body is the JSON object.
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,              -- e.g. users, channels/{serverId}
    id         TEXT NOT NULL,              -- document key
    body       TEXT NOT NULL,              -- JSON object
    updated_at TEXT NOT NULL,              -- ISO-8601

    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
