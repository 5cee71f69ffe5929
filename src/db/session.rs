use libsql::params;

use super::helpers::{query_all, query_optional};
use super::models::{ResponseRow, SessionRow};
use super::Db;
use crate::error::Result;
use crate::models::AnswerSubmission;

impl Db {
    /// Insert a session for the (topic, student) pair, or return the id of
    /// the one that already exists. The unique index on
    /// `(topic_id, student_id)` makes the race between concurrent creates
    /// collapse into a benign re-read.
    pub async fn find_or_create_session(
        &self,
        id: &str,
        topic_id: &str,
        student_id: &str,
        started_utc: &str,
    ) -> Result<String> {
        let conn = self.conn().await?;

        let inserted = conn
            .execute(
                r#"
                INSERT INTO student_sessions (id, topic_id, student_id, started_utc)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(topic_id, student_id) DO NOTHING
                "#,
                params![id, topic_id, student_id, started_utc],
            )
            .await?;

        let existing: Option<SessionRow> = query_optional(
            &conn,
            "SELECT id, topic_id, student_id, started_utc FROM student_sessions WHERE topic_id = ?1 AND student_id = ?2",
            params![topic_id, student_id],
        )
        .await?;

        // The row must exist: either we just inserted it or the conflict
        // target did. A miss here means the store dropped our write.
        let session_id = existing
            .map(|s| s.id)
            .ok_or(crate::Error::NotFound("session"))?;

        if inserted > 0 {
            tracing::info!("session created for topic={topic_id} student={student_id}");
        } else {
            tracing::info!("existing session reused for topic={topic_id} student={student_id}");
        }
        Ok(session_id)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionRow>> {
        let conn = self.conn().await?;
        query_optional(
            &conn,
            "SELECT id, topic_id, student_id, started_utc FROM student_sessions WHERE id = ?1",
            params![session_id],
        )
        .await
    }

    pub async fn session_student(&self, session_id: &str) -> Result<Option<String>> {
        Ok(self.get_session(session_id).await?.map(|s| s.student_id))
    }

    /// Upsert all submitted responses in one transaction. Resubmitting a
    /// question replaces the earlier answer for that question.
    pub async fn upsert_responses(
        &self,
        session_id: &str,
        entries: &[(String, AnswerSubmission)],
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let conn = self.conn().await?;
        let tx = conn.transaction().await?;

        for (id, submission) in entries {
            tx.execute(
                r#"
                INSERT INTO student_responses (id, session_id, question_id, answer)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(session_id, question_id) DO UPDATE SET answer = excluded.answer
                "#,
                params![
                    id.as_str(),
                    session_id,
                    submission.question_id.as_str(),
                    submission.answer.as_str(),
                ],
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "{} responses recorded for session={session_id}",
            entries.len()
        );
        Ok(())
    }

    pub async fn responses_for_session(&self, session_id: &str) -> Result<Vec<ResponseRow>> {
        let conn = self.conn().await?;
        query_all(
            &conn,
            "SELECT question_id, answer FROM student_responses WHERE session_id = ?1 ORDER BY id",
            params![session_id],
        )
        .await
    }
}
