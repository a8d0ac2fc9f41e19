use crate::models::entities::student;
use crate::models::lesson_signal::{self, LessonSignalDto, LessonSignalType};
use async_trait::async_trait;
use chrono::Utc;
use kit::{DbConnection, FrameworkError};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[async_trait]
pub trait LessonSignalRepository: Send + Sync {
    async fn all(&self) -> Result<Vec<LessonSignalDto>, FrameworkError>;

    async fn find(&self, id: i32) -> Result<Option<LessonSignalDto>, FrameworkError>;

    /// Record a signal from a chat user; unknown users are a 400
    async fn create(
        &self,
        user_id: &str,
        signal_type: LessonSignalType,
    ) -> Result<LessonSignalDto, FrameworkError>;

    /// Returns whether a signal was removed
    async fn delete(&self, id: i32) -> Result<bool, FrameworkError>;
}

pub struct SqlLessonSignalRepository {
    conn: DbConnection,
}

impl SqlLessonSignalRepository {
    pub fn from_connection(conn: DbConnection) -> Self {
        Self { conn }
    }
}

fn to_dto((signal, student): (lesson_signal::Model, Option<student::Model>)) -> LessonSignalDto {
    let user_id = student.map(|s| s.user_id).unwrap_or_default();
    LessonSignalDto::from_parts(signal, user_id)
}

#[async_trait]
impl LessonSignalRepository for SqlLessonSignalRepository {
    async fn all(&self) -> Result<Vec<LessonSignalDto>, FrameworkError> {
        let rows = lesson_signal::Entity::find()
            .find_also_related(student::Entity)
            .order_by_asc(lesson_signal::Column::Timestamp)
            .order_by_asc(lesson_signal::Column::Id)
            .all(self.conn.inner())
            .await?;
        Ok(rows.into_iter().map(to_dto).collect())
    }

    async fn find(&self, id: i32) -> Result<Option<LessonSignalDto>, FrameworkError> {
        let row = lesson_signal::Entity::find_by_id(id)
            .find_also_related(student::Entity)
            .one(self.conn.inner())
            .await?;
        Ok(row.map(to_dto))
    }

    async fn create(
        &self,
        user_id: &str,
        signal_type: LessonSignalType,
    ) -> Result<LessonSignalDto, FrameworkError> {
        let student = student::Entity::find()
            .filter(student::Column::UserId.eq(user_id))
            .one(self.conn.inner())
            .await?
            .ok_or_else(|| {
                FrameworkError::bad_request(format!("No student with user_id '{}'", user_id))
            })?;

        let signal = lesson_signal::ActiveModel {
            timestamp: Set(Utc::now()),
            signal_type: Set(signal_type.value()),
            student_id: Set(student.id),
            ..Default::default()
        }
        .insert(self.conn.inner())
        .await?;

        tracing::info!(id = signal.id, user_id, signal = ?signal_type, "lesson signal recorded");
        Ok(LessonSignalDto::from_parts(signal, student.user_id))
    }

    async fn delete(&self, id: i32) -> Result<bool, FrameworkError> {
        let result = lesson_signal::Entity::delete_by_id(id)
            .exec(self.conn.inner())
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentInput;
    use crate::repositories::{testing, SqlStudentRepository, StudentRepository};

    async fn setup() -> SqlLessonSignalRepository {
        let conn = testing::memory().await;
        SqlStudentRepository::from_connection(conn.clone())
            .create(StudentInput {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                user_id: "U1".to_string(),
            })
            .await
            .unwrap();
        SqlLessonSignalRepository::from_connection(conn)
    }

    #[tokio::test]
    async fn test_create_joins_user_id() {
        let repo = setup().await;
        let created = repo.create("U1", LessonSignalType::BoringSimple).await.unwrap();

        assert_eq!(created.user_id, "U1");
        assert_eq!(created.signal_type, LessonSignalType::BoringSimple);
        assert_eq!(repo.find(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(repo.all().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_unknown_user_is_bad_request() {
        let repo = setup().await;
        let err = repo.create("U404", LessonSignalType::Simple).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(repo.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let created = repo.create("U1", LessonSignalType::Simple).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert_eq!(repo.find(created.id).await.unwrap(), None);
    }
}
