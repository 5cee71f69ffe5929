//! Topic creation: one batch LLM call produces the calibrated reference
//! answers for every question, validated and persisted atomically.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use ulid::Ulid;

use crate::db::Db;
use crate::error::{Error, Result};
use crate::llm::{extract_json, LanguageModel};
use crate::models::{
    GeneratedAnswer, Level, Question, Topic, MAX_ANSWER_LEN, MAX_QUESTION_LEN, MAX_TITLE_LEN,
};
use crate::prompts;

#[derive(Debug, Clone)]
pub struct CreateTopic {
    pub title: String,
    /// Question texts in the order they should appear; the order doubles as
    /// the index contract of the batch prompt.
    pub questions: Vec<String>,
    /// Caller-provided conspectus text. Ignored when `generate_conspect`
    /// is set.
    pub conspect: Option<String>,
    /// Issue a second, non-JSON completion after the topic is persisted and
    /// attach the result as the conspectus.
    pub generate_conspect: bool,
    pub language: String,
    pub teacher_id: Option<String>,
}

pub struct GenerationService {
    db: Db,
    llm: Arc<dyn LanguageModel>,
}

// Structured output contract of the batch prompt. Everything beyond this
// shape (extra keys, the redundant per-answer score) is ignored.
#[derive(Deserialize)]
struct BatchResponse {
    items: Vec<BatchItem>,
}

#[derive(Deserialize)]
struct BatchItem {
    index: i64,
    #[serde(default)]
    answers: Vec<RawAnswer>,
}

#[derive(Deserialize)]
struct RawAnswer {
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl GenerationService {
    pub fn new(db: Db, llm: Arc<dyn LanguageModel>) -> Self {
        Self { db, llm }
    }

    /// Create a topic with generated reference answers for every question.
    ///
    /// The batch completion strictly precedes the optional conspectus
    /// completion. Nothing is persisted unless the batch response passes
    /// validation; a structural violation fails the whole create.
    pub async fn create_topic(&self, req: CreateTopic) -> Result<Topic> {
        validate(&req)?;
        let language = effective_language(&req.language);

        let prompt = prompts::batch_generation(&req.title, &req.questions, language);
        let raw = self.llm.complete(&prompt, true).await?;
        let answers_by_index = parse_batch(&raw, req.questions.len())?;

        let questions = req
            .questions
            .iter()
            .zip(answers_by_index)
            .map(|(text, answers)| Question {
                id: Ulid::new().to_string(),
                text: text.trim().to_owned(),
                answers: answers.unwrap_or_default(),
            })
            .collect();

        let mut topic = Topic {
            id: Ulid::new().to_string(),
            title: req.title.trim().to_owned(),
            created_utc: Utc::now(),
            conspect: req
                .conspect
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
            teacher_id: req.teacher_id.clone(),
            questions,
        };

        self.db.insert_topic(&topic).await?;

        if req.generate_conspect && topic.conspect.is_none() {
            let cprompt = prompts::conspectus(&topic.title, &req.questions, language);
            let conspect = self.llm.complete(&cprompt, false).await?;
            self.db.set_topic_conspect(&topic.id, &conspect).await?;
            topic.conspect = Some(conspect);
        }

        Ok(topic)
    }

    pub async fn get_topic(&self, topic_id: &str) -> Result<Topic> {
        self.db
            .get_topic(topic_id)
            .await?
            .ok_or(Error::NotFound("topic"))
    }
}

fn effective_language(language: &str) -> &str {
    let trimmed = language.trim();
    if trimmed.is_empty() {
        "English"
    } else {
        trimmed
    }
}

fn validate(req: &CreateTopic) -> Result<()> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(Error::Validation("topic title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::Validation(format!(
            "topic title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    if req.questions.is_empty() {
        return Err(Error::Validation(
            "a topic needs at least one question".into(),
        ));
    }
    for (i, q) in req.questions.iter().enumerate() {
        if q.trim().is_empty() {
            return Err(Error::Validation(format!("question {i} is empty")));
        }
        if q.chars().count() > MAX_QUESTION_LEN {
            return Err(Error::Validation(format!(
                "question {i} exceeds {MAX_QUESTION_LEN} characters"
            )));
        }
    }
    Ok(())
}

/// Parse and validate the batch response. Returns the generated answers per
/// question index; a question the model skipped stays `None` rather than
/// failing the create.
fn parse_batch(raw: &str, question_count: usize) -> Result<Vec<Option<Vec<GeneratedAnswer>>>> {
    let payload = extract_json(raw).unwrap_or(raw);
    let batch: BatchResponse = serde_json::from_str(payload).map_err(|e| {
        Error::Generation(format!("batch response is not the expected JSON shape: {e}"))
    })?;

    let mut by_index: Vec<Option<Vec<GeneratedAnswer>>> = vec![None; question_count];

    for item in batch.items {
        if item.index < 0 || item.index as usize >= question_count {
            return Err(Error::Generation(format!(
                "answer index {} is out of range for {} questions",
                item.index, question_count
            )));
        }
        if item.answers.is_empty() {
            return Err(Error::Generation(format!(
                "no answers returned for question {}",
                item.index
            )));
        }

        let mut answers = Vec::new();
        for a in item.answers {
            let text = a.text.as_deref().unwrap_or("").trim().to_owned();
            if text.is_empty() {
                continue;
            }
            if text.chars().count() > MAX_ANSWER_LEN {
                return Err(Error::Generation(format!(
                    "an answer for question {} exceeds {MAX_ANSWER_LEN} characters",
                    item.index
                )));
            }
            answers.push(GeneratedAnswer {
                id: Ulid::new().to_string(),
                level: Level::from_label_lenient(a.level.as_deref()),
                text,
            });
        }

        if answers.is_empty() {
            return Err(Error::Generation(format!(
                "every answer for question {} is empty",
                item.index
            )));
        }

        by_index[item.index as usize] = Some(answers);
    }

    Ok(by_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_batch_maps_levels_leniently() {
        let raw = r#"{"items":[{"index":0,"answers":[
            {"level":"LOW","text":" a "},
            {"level":"weird","text":"b"},
            {"level":"Medium","text":"c"},
            {"text":"d"}
        ]}]}"#;
        let parsed = parse_batch(raw, 1).unwrap();
        let answers = parsed[0].as_ref().unwrap();
        assert_eq!(answers.len(), 4);
        assert_eq!(answers[0].level, Level::Low);
        assert_eq!(answers[0].text, "a");
        assert_eq!(answers[1].level, Level::Low);
        assert_eq!(answers[2].level, Level::Medium);
        assert_eq!(answers[3].level, Level::Low);
    }

    #[test]
    fn parse_batch_drops_empty_answers_but_not_all() {
        let raw = r#"{"items":[{"index":0,"answers":[
            {"level":"low","text":"   "},
            {"level":"high","text":"solid"}
        ]}]}"#;
        let parsed = parse_batch(raw, 1).unwrap();
        assert_eq!(parsed[0].as_ref().unwrap().len(), 1);
    }

    #[test]
    fn parse_batch_rejects_out_of_range_index() {
        let raw = r#"{"items":[{"index":3,"answers":[{"level":"low","text":"a"}]}]}"#;
        assert!(matches!(
            parse_batch(raw, 2),
            Err(Error::Generation(_))
        ));
    }

    #[test]
    fn parse_batch_rejects_all_blank_answers() {
        let raw = r#"{"items":[{"index":0,"answers":[{"level":"low","text":"  "}]}]}"#;
        assert!(matches!(parse_batch(raw, 1), Err(Error::Generation(_))));
    }

    #[test]
    fn parse_batch_rejects_overlong_answer_text() {
        let long = "x".repeat(MAX_ANSWER_LEN + 1);
        let raw = format!(
            r#"{{"items":[{{"index":0,"answers":[{{"level":"low","text":"{long}"}}]}}]}}"#
        );
        assert!(matches!(parse_batch(&raw, 1), Err(Error::Generation(_))));
    }

    #[test]
    fn parse_batch_rejects_empty_answer_array() {
        let raw = r#"{"items":[{"index":0,"answers":[]}]}"#;
        assert!(matches!(parse_batch(raw, 1), Err(Error::Generation(_))));
    }

    #[test]
    fn parse_batch_tolerates_code_fences() {
        let raw = "```json\n{\"items\":[{\"index\":0,\"answers\":[{\"level\":\"high\",\"text\":\"x\"}]}]}\n```";
        let parsed = parse_batch(raw, 1).unwrap();
        assert!(parsed[0].is_some());
    }

    #[test]
    fn parse_batch_leaves_skipped_questions_unanswered() {
        let raw = r#"{"items":[{"index":1,"answers":[{"level":"low","text":"a"}]}]}"#;
        let parsed = parse_batch(raw, 2).unwrap();
        assert!(parsed[0].is_none());
        assert!(parsed[1].is_some());
    }
}
