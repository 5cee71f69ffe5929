//! Document ingestion and nearest-neighbor retrieval over the embedding
//! space.
//!
//! Ranking uses exact squared-L2 distance over the stored vectors. One
//! fixed metric keeps the result order total and reproducible.

use std::sync::Arc;

use ulid::Ulid;

use crate::db::Db;
use crate::error::{Error, Result};
use crate::llm::LanguageModel;
use crate::models::{RagDocument, DEFAULT_RETRIEVE_K, MAX_DOCUMENT_LEN, MAX_SOURCE_LEN};

pub struct RetrievalService {
    db: Db,
    llm: Arc<dyn LanguageModel>,
}

impl RetrievalService {
    pub fn new(db: Db, llm: Arc<dyn LanguageModel>) -> Self {
        Self { db, llm }
    }

    /// Embed `content` and store it as a retrievable document.
    pub async fn ingest(&self, content: &str, source: Option<&str>) -> Result<RagDocument> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation("document content must not be empty".into()));
        }
        if content.chars().count() > MAX_DOCUMENT_LEN {
            return Err(Error::Validation(format!(
                "document content exceeds {MAX_DOCUMENT_LEN} characters"
            )));
        }
        if source.is_some_and(|s| s.chars().count() > MAX_SOURCE_LEN) {
            return Err(Error::Validation(format!(
                "document source exceeds {MAX_SOURCE_LEN} characters"
            )));
        }

        let embedding = self.llm.embed(content).await?;

        let doc = RagDocument {
            id: Ulid::new().to_string(),
            source: source.map(str::to_owned),
            content: content.to_owned(),
            embedding,
        };
        self.db.insert_document(&doc).await?;

        Ok(doc)
    }

    /// Return the `k` documents nearest to `query`, nearest first.
    /// `k <= 0` is corrected to the default of 4.
    pub async fn retrieve(&self, query: &str, k: i64) -> Result<Vec<RagDocument>> {
        if query.trim().is_empty() {
            return Err(Error::Validation("query must not be empty".into()));
        }

        let query_embedding = self.llm.embed(query).await?;
        let documents = self.db.documents().await?;

        Ok(rank(documents, &query_embedding, k))
    }
}

fn rank(documents: Vec<RagDocument>, query: &[f32], k: i64) -> Vec<RagDocument> {
    let k = if k <= 0 { DEFAULT_RETRIEVE_K } else { k as usize };

    let mut scored: Vec<(f32, RagDocument)> = documents
        .into_iter()
        .filter_map(|doc| {
            if doc.embedding.len() != query.len() {
                tracing::warn!(
                    "document {} has {} dims, query has {}; excluded",
                    doc.id,
                    doc.embedding.len(),
                    query.len()
                );
                return None;
            }
            Some((squared_l2(&doc.embedding, query), doc))
        })
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().take(k).map(|(_, doc)| doc).collect()
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
