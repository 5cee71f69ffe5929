// Database schema initialization
//
// Uniqueness contracts that coordinate concurrent requests live here as
// unique indexes, not in application code: one session per (topic, student),
// one response per (session, question), one evaluation per session.

use crate::error::Result;

pub async fn create_schema(conn: &libsql::Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            created_utc TEXT NOT NULL,
            conspect TEXT,
            teacher_id TEXT
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id TEXT PRIMARY KEY,
            topic_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            FOREIGN KEY(topic_id) REFERENCES topics(id) ON DELETE CASCADE
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS generated_answers (
            id TEXT PRIMARY KEY,
            question_id TEXT NOT NULL,
            level INTEGER NOT NULL,
            text TEXT NOT NULL,
            FOREIGN KEY(question_id) REFERENCES questions(id) ON DELETE CASCADE
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS student_sessions (
            id TEXT PRIMARY KEY,
            topic_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            started_utc TEXT NOT NULL,
            FOREIGN KEY(topic_id) REFERENCES topics(id)
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_unique_topic_student
        ON student_sessions(topic_id, student_id)
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS student_responses (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            question_id TEXT NOT NULL,
            answer TEXT NOT NULL,
            FOREIGN KEY(session_id) REFERENCES student_sessions(id) ON DELETE CASCADE,
            FOREIGN KEY(question_id) REFERENCES questions(id)
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_responses_unique_session_question
        ON student_responses(session_id, question_id)
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS evaluations (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            total_score REAL NOT NULL,
            report_json TEXT NOT NULL,
            FOREIGN KEY(session_id) REFERENCES student_sessions(id) ON DELETE CASCADE
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_evaluations_unique_session
        ON evaluations(session_id)
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS rag_documents (
            id TEXT PRIMARY KEY,
            source TEXT,
            content TEXT NOT NULL,
            embedding TEXT NOT NULL
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS classes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            owner_teacher_id TEXT NOT NULL
        )
        "#,
        (),
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS class_members (
            class_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            FOREIGN KEY(class_id) REFERENCES classes(id) ON DELETE CASCADE,
            UNIQUE(class_id, user_id)
        )
        "#,
        (),
    )
    .await?;

    Ok(())
}
