use libsql::params;

use super::helpers::query_optional;
use super::models::EvaluationRow;
use super::Db;
use crate::error::Result;

impl Db {
    pub async fn evaluation_for_session(
        &self,
        session_id: &str,
    ) -> Result<Option<EvaluationRow>> {
        let conn = self.conn().await?;
        query_optional(
            &conn,
            "SELECT id, session_id, total_score, report_json FROM evaluations WHERE session_id = ?1",
            params![session_id],
        )
        .await
    }

    /// Write-once insert of the session's evaluation. Losing the race on
    /// the unique `session_id` index is not an error: the id that won is
    /// re-read and returned.
    pub async fn insert_evaluation(
        &self,
        id: &str,
        session_id: &str,
        total_score: f64,
        report_json: &str,
    ) -> Result<String> {
        let conn = self.conn().await?;

        let inserted = conn
            .execute(
                r#"
                INSERT INTO evaluations (id, session_id, total_score, report_json)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(session_id) DO NOTHING
                "#,
                params![id, session_id, total_score, report_json],
            )
            .await?;

        if inserted > 0 {
            tracing::info!("evaluation {id} recorded for session={session_id}");
            return Ok(id.to_owned());
        }

        let winner: Option<EvaluationRow> = query_optional(
            &conn,
            "SELECT id, session_id, total_score, report_json FROM evaluations WHERE session_id = ?1",
            params![session_id],
        )
        .await?;

        winner
            .map(|e| e.id)
            .ok_or(crate::Error::NotFound("evaluation"))
    }

    pub async fn get_evaluation(&self, evaluation_id: &str) -> Result<Option<EvaluationRow>> {
        let conn = self.conn().await?;
        query_optional(
            &conn,
            "SELECT id, session_id, total_score, report_json FROM evaluations WHERE id = ?1",
            params![evaluation_id],
        )
        .await
    }

    pub async fn report_by_session(&self, session_id: &str) -> Result<Option<String>> {
        Ok(self
            .evaluation_for_session(session_id)
            .await?
            .map(|e| e.report_json))
    }
}
