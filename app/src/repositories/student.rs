use crate::models::entities::lesson_signal;
use crate::models::student::{self, Student, StudentInput};
use async_trait::async_trait;
use kit::{DbConnection, FrameworkError};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn all(&self) -> Result<Vec<Student>, FrameworkError>;

    async fn find(&self, id: i32) -> Result<Option<Student>, FrameworkError>;

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Student>, FrameworkError>;

    /// Fails with 409 when the chat user already has a student
    async fn create(&self, input: StudentInput) -> Result<Student, FrameworkError>;

    /// Fails with 404 for an unknown id, 409 when the chat user belongs to
    /// another student
    async fn update(&self, id: i32, input: StudentInput) -> Result<Student, FrameworkError>;

    /// Fails with 404 for an unknown id, 409 while the student has signals
    async fn delete(&self, id: i32) -> Result<(), FrameworkError>;
}

pub struct SqlStudentRepository {
    conn: DbConnection,
}

impl SqlStudentRepository {
    pub fn from_connection(conn: DbConnection) -> Self {
        Self { conn }
    }

    async fn ensure_user_id_free(&self, user_id: &str, except: Option<i32>) -> Result<(), FrameworkError> {
        match self.find_by_user_id(user_id).await? {
            Some(existing) if Some(existing.id) != except => Err(user_id_taken(user_id)),
            _ => Ok(()),
        }
    }
}

fn user_id_taken(user_id: &str) -> FrameworkError {
    FrameworkError::conflict(format!("A student with user_id '{}' already exists", user_id))
}

fn invalid(field: &str) -> FrameworkError {
    FrameworkError::bad_request(format!("Field '{}' must not be empty", field))
}

/// Unique violations lost to a concurrent writer become conflicts
fn write_error(e: DbErr, user_id: &str) -> FrameworkError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => user_id_taken(user_id),
        _ => e.into(),
    }
}

#[async_trait]
impl StudentRepository for SqlStudentRepository {
    async fn all(&self) -> Result<Vec<Student>, FrameworkError> {
        Ok(student::Entity::find()
            .order_by_asc(student::Column::Id)
            .all(self.conn.inner())
            .await?)
    }

    async fn find(&self, id: i32) -> Result<Option<Student>, FrameworkError> {
        Ok(student::Entity::find_by_id(id).one(self.conn.inner()).await?)
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Student>, FrameworkError> {
        Ok(student::Entity::find()
            .filter(student::Column::UserId.eq(user_id))
            .one(self.conn.inner())
            .await?)
    }

    async fn create(&self, input: StudentInput) -> Result<Student, FrameworkError> {
        let input = input.normalized().map_err(invalid)?;
        self.ensure_user_id_free(&input.user_id, None).await?;

        let user_id = input.user_id.clone();
        let created = input
            .into_active_model()
            .insert(self.conn.inner())
            .await
            .map_err(|e| write_error(e, &user_id))?;
        tracing::info!(id = created.id, user_id = %created.user_id, "student created");
        Ok(created)
    }

    async fn update(&self, id: i32, input: StudentInput) -> Result<Student, FrameworkError> {
        let input = input.normalized().map_err(invalid)?;
        let existing = self
            .find(id)
            .await?
            .ok_or_else(|| FrameworkError::model_not_found("Student"))?;
        self.ensure_user_id_free(&input.user_id, Some(id)).await?;

        let user_id = input.user_id.clone();
        let mut model: student::ActiveModel = existing.into();
        model.first_name = Set(input.first_name);
        model.last_name = Set(input.last_name);
        model.user_id = Set(input.user_id);
        model
            .update(self.conn.inner())
            .await
            .map_err(|e| write_error(e, &user_id))
    }

    async fn delete(&self, id: i32) -> Result<(), FrameworkError> {
        if self.find(id).await?.is_none() {
            return Err(FrameworkError::model_not_found("Student"));
        }

        let signals = lesson_signal::Entity::find()
            .filter(lesson_signal::Column::StudentId.eq(id))
            .count(self.conn.inner())
            .await?;
        if signals > 0 {
            return Err(FrameworkError::conflict(format!(
                "Student {} still has {} lesson signals",
                id, signals
            )));
        }

        student::Entity::delete_by_id(id).exec(self.conn.inner()).await?;
        tracing::info!(id, "student deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::testing;
    use chrono::Utc;

    fn input(first: &str, last: &str, user_id: &str) -> StudentInput {
        StudentInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            user_id: user_id.to_string(),
        }
    }

    async fn repository() -> SqlStudentRepository {
        SqlStudentRepository::from_connection(testing::memory().await)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = repository().await;
        let created = repo.create(input("Ada", "Lovelace", "U1")).await.unwrap();

        assert_eq!(repo.find(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(repo.find_by_user_id("U1").await.unwrap(), Some(created));
        assert_eq!(repo.find_by_user_id("U2").await.unwrap(), None);
        assert_eq!(repo.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_user_id_conflicts() {
        let repo = repository().await;
        repo.create(input("Ada", "Lovelace", "U1")).await.unwrap();

        let err = repo.create(input("Alan", "Turing", "U1")).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected() {
        let repo = repository().await;
        let err = repo.create(input("", "Lovelace", "U1")).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_update() {
        let repo = repository().await;
        let ada = repo.create(input("Ada", "Lovelace", "U1")).await.unwrap();
        let alan = repo.create(input("Alan", "Turing", "U2")).await.unwrap();

        let updated = repo.update(ada.id, input("Ada", "King", "U1")).await.unwrap();
        assert_eq!(updated.last_name, "King");

        let taken = repo.update(ada.id, input("Ada", "King", "U2")).await.unwrap_err();
        assert_eq!(taken.status_code(), 409);

        let missing = repo.update(alan.id + 100, input("X", "Y", "U9")).await.unwrap_err();
        assert_eq!(missing.status_code(), 404);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repository().await;
        let ada = repo.create(input("Ada", "Lovelace", "U1")).await.unwrap();

        repo.delete(ada.id).await.unwrap();
        assert_eq!(repo.find(ada.id).await.unwrap(), None);
        assert_eq!(repo.delete(ada.id).await.unwrap_err().status_code(), 404);
    }

    #[tokio::test]
    async fn test_delete_with_signals_conflicts() {
        let conn = testing::memory().await;
        let repo = SqlStudentRepository::from_connection(conn.clone());
        let ada = repo.create(input("Ada", "Lovelace", "U1")).await.unwrap();

        lesson_signal::ActiveModel {
            timestamp: Set(Utc::now()),
            signal_type: Set(0),
            student_id: Set(ada.id),
            ..Default::default()
        }
        .insert(conn.inner())
        .await
        .unwrap();

        assert_eq!(repo.delete(ada.id).await.unwrap_err().status_code(), 409);
    }
}
