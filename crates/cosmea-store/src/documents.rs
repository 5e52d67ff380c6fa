//! Document CRUD on the SQLite [`Database`] and its [`DocumentStore`] impl.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::database::Database;
use crate::document::{
    apply_array_remove, apply_array_union, merge_fields, parse_body, Document, DocumentRef,
    DocumentStore, Filter, Snapshot,
};
use crate::error::{Result, StoreError};

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_document(&self, doc: &DocumentRef) -> Result<Document> {
        let conn = self.conn()?;
        read_body(&conn, doc)?.ok_or(StoreError::NotFound)
    }

    /// List a collection, ordered by key.
    pub fn list_documents(&self, collection: &str) -> Result<Vec<Snapshot>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, body
             FROM documents
             WHERE collection = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshots = Vec::new();
        for row in rows {
            let (id, body) = row?;
            snapshots.push(Snapshot {
                id,
                data: parse_body(&body)?,
            });
        }
        Ok(snapshots)
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    pub fn put_document(&self, doc: &DocumentRef, data: &Document) -> Result<()> {
        let conn = self.conn()?;
        write_body(&conn, doc, data)
    }

    /// Read, mutate and write back one document inside a transaction.
    pub fn modify_document<F>(&self, doc: &DocumentRef, f: F) -> Result<()>
    where
        F: FnOnce(&mut Document),
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut data = read_body(&tx, doc)?.ok_or(StoreError::NotFound)?;
        f(&mut data);
        write_body(&tx, doc, &data)?;

        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Returns `true` if a row was deleted.
    pub fn delete_document(&self, doc: &DocumentRef) -> Result<bool> {
        let affected = self.conn()?.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![doc.collection, doc.id],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_body(conn: &Connection, doc: &DocumentRef) -> Result<Option<Document>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![doc.collection, doc.id],
            |row| row.get(0),
        )
        .optional()?;
    body.as_deref().map(parse_body).transpose()
}

fn write_body(conn: &Connection, doc: &DocumentRef, data: &Document) -> Result<()> {
    let body = serde_json::to_string(data)?;
    conn.execute(
        "INSERT OR REPLACE INTO documents (collection, id, body, updated_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![doc.collection, doc.id, body, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

#[async_trait]
impl DocumentStore for Database {
    async fn get(&self, doc: &DocumentRef) -> Result<Document> {
        self.get_document(doc)
    }

    async fn set(&self, doc: &DocumentRef, data: Document) -> Result<()> {
        self.put_document(doc, &data)
    }

    async fn update(&self, doc: &DocumentRef, fields: Document) -> Result<()> {
        self.modify_document(doc, |target| merge_fields(target, fields))
    }

    async fn delete(&self, doc: &DocumentRef) -> Result<bool> {
        self.delete_document(doc)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Snapshot>> {
        self.list_documents(collection)
    }

    // Equality filters run over the decoded bodies.
    async fn query_eq(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Snapshot>> {
        let mut snapshots = self.list_documents(collection)?;
        snapshots.retain(|s| filters.iter().all(|f| f.matches(&s.data)));
        Ok(snapshots)
    }

    async fn array_union(&self, doc: &DocumentRef, field: &str, values: Vec<Value>) -> Result<()> {
        self.modify_document(doc, |target| apply_array_union(target, field, &values))
    }

    async fn array_remove(&self, doc: &DocumentRef, field: &str, values: Vec<Value>) -> Result<()> {
        self.modify_document(doc, |target| apply_array_remove(target, field, &values))
    }
}
