// Row structs deserialized via `libsql::de::from_row`

use serde::Deserialize;

#[derive(Deserialize)]
pub struct TopicRow {
    pub id: String,
    pub title: String,
    pub created_utc: String,
    pub conspect: Option<String>,
    pub teacher_id: Option<String>,
}

#[derive(Deserialize)]
pub struct QuestionRow {
    pub id: String,
    pub text: String,
}

#[derive(Deserialize)]
pub struct AnswerRow {
    pub id: String,
    pub question_id: String,
    pub level: i64,
    pub text: String,
}

#[derive(Deserialize)]
pub struct SessionRow {
    pub id: String,
    pub topic_id: String,
    pub student_id: String,
    pub started_utc: String,
}

#[derive(Deserialize)]
pub struct ResponseRow {
    pub question_id: String,
    pub answer: String,
}

#[derive(Deserialize)]
pub struct EvaluationRow {
    pub id: String,
    pub session_id: String,
    pub total_score: f64,
    pub report_json: String,
}

#[derive(Deserialize)]
pub struct DocumentRow {
    pub id: String,
    pub source: Option<String>,
    pub content: String,
    pub embedding: String,
}
