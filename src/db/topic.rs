use std::collections::HashMap;

use chrono::{DateTime, Utc};
use libsql::params;

use super::helpers::{query_all, query_exists, query_optional};
use super::models::{AnswerRow, QuestionRow, TopicRow};
use super::{opt_text, Db};
use crate::error::Result;
use crate::models::{GeneratedAnswer, Level, Question, Topic};

impl Db {
    /// Insert a topic with all its questions and generated answers
    /// atomically in a transaction. Question insertion order is preserved
    /// through the `position` column.
    pub async fn insert_topic(&self, topic: &Topic) -> Result<()> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await?;

        tx.execute(
            "INSERT INTO topics (id, title, created_utc, conspect, teacher_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                topic.id.as_str(),
                topic.title.as_str(),
                topic.created_utc.to_rfc3339(),
                opt_text(topic.conspect.as_deref()),
                opt_text(topic.teacher_id.as_deref()),
            ],
        )
        .await?;

        for (position, question) in topic.questions.iter().enumerate() {
            tx.execute(
                "INSERT INTO questions (id, topic_id, position, text) VALUES (?1, ?2, ?3, ?4)",
                params![
                    question.id.as_str(),
                    topic.id.as_str(),
                    position as i64,
                    question.text.as_str(),
                ],
            )
            .await?;

            for answer in &question.answers {
                tx.execute(
                    "INSERT INTO generated_answers (id, question_id, level, text) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        answer.id.as_str(),
                        question.id.as_str(),
                        answer.level.ordinal(),
                        answer.text.as_str(),
                    ],
                )
                .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            "topic created: {} with {} questions",
            topic.id,
            topic.questions.len()
        );
        Ok(())
    }

    /// Load the full topic graph: questions in their original order, each
    /// with its generated answers strongest level first.
    pub async fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>> {
        let conn = self.conn().await?;

        let Some(row) = query_optional::<TopicRow>(
            &conn,
            "SELECT id, title, created_utc, conspect, teacher_id FROM topics WHERE id = ?1",
            params![topic_id],
        )
        .await?
        else {
            return Ok(None);
        };

        let questions = query_all::<QuestionRow>(
            &conn,
            "SELECT id, text FROM questions WHERE topic_id = ?1 ORDER BY position",
            params![topic_id],
        )
        .await?;

        let answers = query_all::<AnswerRow>(
            &conn,
            r#"
            SELECT a.id AS id, a.question_id AS question_id, a.level AS level, a.text AS text
            FROM generated_answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.topic_id = ?1
            ORDER BY a.level DESC, a.id
            "#,
            params![topic_id],
        )
        .await?;

        let mut by_question: HashMap<String, Vec<GeneratedAnswer>> = HashMap::new();
        for a in answers {
            by_question
                .entry(a.question_id)
                .or_default()
                .push(GeneratedAnswer {
                    id: a.id,
                    level: Level::from_ordinal(a.level).unwrap_or(Level::Low),
                    text: a.text,
                });
        }

        let questions = questions
            .into_iter()
            .map(|q| {
                let answers = by_question.remove(&q.id).unwrap_or_default();
                Question {
                    id: q.id,
                    text: q.text,
                    answers,
                }
            })
            .collect();

        Ok(Some(Topic {
            id: row.id,
            title: row.title,
            created_utc: DateTime::parse_from_rfc3339(&row.created_utc)?.with_timezone(&Utc),
            conspect: row.conspect,
            teacher_id: row.teacher_id,
            questions,
        }))
    }

    pub async fn topic_exists(&self, topic_id: &str) -> Result<bool> {
        let conn = self.conn().await?;
        query_exists(
            &conn,
            "SELECT EXISTS(SELECT 1 FROM topics WHERE id = ?1)",
            params![topic_id],
        )
        .await
    }

    /// Conspectus backfill. The only write a topic sees after creation.
    pub async fn set_topic_conspect(&self, topic_id: &str, conspect: &str) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE topics SET conspect = ?1 WHERE id = ?2",
            params![conspect, topic_id],
        )
        .await?;

        tracing::info!("conspect attached to topic {topic_id}");
        Ok(())
    }
}
