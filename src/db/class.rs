// Minimal class/membership storage backing the dynamic authorization checks

use libsql::params;

use super::helpers::query_exists;
use super::Db;
use crate::error::Result;

impl Db {
    pub async fn create_class(&self, id: &str, name: &str, owner_teacher_id: &str) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO classes (id, name, owner_teacher_id) VALUES (?1, ?2, ?3)",
            params![id, name, owner_teacher_id],
        )
        .await?;

        tracing::info!("class created: {id} owned by {owner_teacher_id}");
        Ok(())
    }

    pub async fn add_class_member(&self, class_id: &str, user_id: &str) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO class_members (class_id, user_id)
            VALUES (?1, ?2)
            ON CONFLICT(class_id, user_id) DO NOTHING
            "#,
            params![class_id, user_id],
        )
        .await?;

        Ok(())
    }

    /// True when the teacher owns at least one class the student belongs to.
    pub async fn teacher_has_student(&self, teacher_id: &str, student_id: &str) -> Result<bool> {
        let conn = self.conn().await?;
        query_exists(
            &conn,
            r#"
            SELECT EXISTS(
                SELECT 1 FROM classes c
                JOIN class_members m ON m.class_id = c.id
                WHERE c.owner_teacher_id = ?1 AND m.user_id = ?2
            )
            "#,
            params![teacher_id, student_id],
        )
        .await
    }
}
