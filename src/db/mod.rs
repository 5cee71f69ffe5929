// Database module - provides data access layer

use std::sync::Arc;

use crate::error::Result;

mod schema;
pub mod helpers;
pub mod models;

mod class;
mod document;
mod evaluation;
mod session;
mod topic;

// Main database handle
#[derive(Clone)]
pub struct Db {
    db: Arc<libsql::Database>,
}

impl Db {
    pub async fn new(url: String, auth_token: String) -> Result<Self> {
        let db = if url.starts_with("file:") {
            // Local SQLite file
            let path = url.strip_prefix("file:").unwrap_or(&url);
            libsql::Builder::new_local(path).build().await?
        } else {
            // Remote Turso database
            libsql::Builder::new_remote(url.to_owned(), auth_token)
                .build()
                .await?
        };

        let conn = db.connect()?;

        // Verify connection
        conn.query("SELECT 1", ()).await?.next().await?;

        // Initialize schema
        schema::create_schema(&conn).await?;

        tracing::info!("database connection has been verified");

        Ok(Self { db: Arc::new(db) })
    }

    /// Open a connection with foreign-key enforcement on. Cascade deletes
    /// for topic and session graphs rely on it. The busy timeout makes a
    /// write that loses the file lock wait for the winner to commit instead
    /// of erroring.
    pub(crate) async fn conn(&self) -> Result<libsql::Connection> {
        let conn = self.db.connect()?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        conn.query("PRAGMA busy_timeout = 5000", ()).await?;
        Ok(conn)
    }
}

/// `NULL`-safe text parameter.
pub(crate) fn opt_text(value: Option<&str>) -> libsql::Value {
    match value {
        Some(s) => libsql::Value::Text(s.to_owned()),
        None => libsql::Value::Null,
    }
}
