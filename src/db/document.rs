use libsql::params;

use super::helpers::query_all;
use super::models::DocumentRow;
use super::{opt_text, Db};
use crate::error::Result;
use crate::models::RagDocument;

impl Db {
    pub async fn insert_document(&self, doc: &RagDocument) -> Result<()> {
        let embedding = serde_json::to_string(&doc.embedding)?;

        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO rag_documents (id, source, content, embedding) VALUES (?1, ?2, ?3, ?4)",
            params![
                doc.id.as_str(),
                opt_text(doc.source.as_deref()),
                doc.content.as_str(),
                embedding,
            ],
        )
        .await?;

        tracing::info!("document ingested: {} ({} dims)", doc.id, doc.embedding.len());
        Ok(())
    }

    pub async fn documents(&self) -> Result<Vec<RagDocument>> {
        let conn = self.conn().await?;
        let rows = query_all::<DocumentRow>(
            &conn,
            "SELECT id, source, content, embedding FROM rag_documents ORDER BY id",
            (),
        )
        .await?;

        rows.into_iter()
            .map(|row| {
                let embedding: Vec<f32> = serde_json::from_str(&row.embedding)?;
                Ok(RagDocument {
                    id: row.id,
                    source: row.source,
                    content: row.content,
                    embedding,
                })
            })
            .collect()
    }
}
