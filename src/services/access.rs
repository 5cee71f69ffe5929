//! Resource-based authorization predicates.
//!
//! These are relationship queries evaluated against current data on every
//! call, not cached role claims. The routing layer composes them with its
//! own guards.

use crate::db::Db;
use crate::error::Result;

/// True when the caller is the student who owns the session.
pub async fn can_access_session(db: &Db, caller_id: &str, session_id: &str) -> Result<bool> {
    Ok(db
        .session_student(session_id)
        .await?
        .is_some_and(|student| student == caller_id))
}

/// True when the teacher owns at least one class the student is a member of.
pub async fn is_teacher_of_student(db: &Db, teacher_id: &str, student_id: &str) -> Result<bool> {
    db.teacher_has_student(teacher_id, student_id).await
}

/// Like [`is_teacher_of_student`], with the student resolved from the
/// session. An unknown session grants nothing.
pub async fn is_teacher_over_session(db: &Db, teacher_id: &str, session_id: &str) -> Result<bool> {
    match db.session_student(session_id).await? {
        Some(student) => db.teacher_has_student(teacher_id, &student).await,
        None => Ok(false),
    }
}
