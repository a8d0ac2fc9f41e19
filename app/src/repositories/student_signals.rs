use crate::models::entities::{lesson_signal, student};
use crate::models::StudentSignal;
use async_trait::async_trait;
use kit::{DbConnection, FrameworkError};
use sea_orm::{ColumnTrait, EntityTrait, JoinType, QueryOrder, QuerySelect, RelationTrait};

#[async_trait]
pub trait StudentSignalsRepository: Send + Sync {
    /// Signal counts per student and type, ordered by last name, first name, type
    async fn all(&self) -> Result<Vec<StudentSignal>, FrameworkError>;
}

pub struct SqlStudentSignalsRepository {
    conn: DbConnection,
}

impl SqlStudentSignalsRepository {
    pub fn from_connection(conn: DbConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl StudentSignalsRepository for SqlStudentSignalsRepository {
    async fn all(&self) -> Result<Vec<StudentSignal>, FrameworkError> {
        Ok(lesson_signal::Entity::find()
            .select_only()
            .column(student::Column::FirstName)
            .column(student::Column::LastName)
            .column(lesson_signal::Column::SignalType)
            .column_as(lesson_signal::Column::Id.count(), "count")
            .join(JoinType::InnerJoin, lesson_signal::Relation::Student.def())
            .group_by(student::Column::Id)
            .group_by(student::Column::FirstName)
            .group_by(student::Column::LastName)
            .group_by(lesson_signal::Column::SignalType)
            .order_by_asc(student::Column::LastName)
            .order_by_asc(student::Column::FirstName)
            .order_by_asc(lesson_signal::Column::SignalType)
            .into_model::<StudentSignal>()
            .all(self.conn.inner())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LessonSignalType, StudentInput};
    use crate::repositories::{
        testing, LessonSignalRepository, SqlLessonSignalRepository, SqlStudentRepository,
        StudentRepository,
    };

    #[tokio::test]
    async fn test_counts_grouped_and_ordered() {
        let conn = testing::memory().await;
        let students = SqlStudentRepository::from_connection(conn.clone());
        let signals = SqlLessonSignalRepository::from_connection(conn.clone());
        let report = SqlStudentSignalsRepository::from_connection(conn);

        for (first, last, user) in [("Alan", "Turing", "U2"), ("Ada", "Lovelace", "U1")] {
            students
                .create(StudentInput {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    user_id: user.to_string(),
                })
                .await
                .unwrap();
        }
        for (user, signal) in [
            ("U2", LessonSignalType::Simple),
            ("U1", LessonSignalType::InterestingSimple),
            ("U1", LessonSignalType::BoringSimple),
            ("U1", LessonSignalType::InterestingSimple),
        ] {
            signals.create(user, signal).await.unwrap();
        }

        let rows: Vec<(String, i32, i64)> = report
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|row| (row.last_name, row.signal_type, row.count))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("Lovelace".to_string(), -1, 1),
                ("Lovelace".to_string(), 1, 2),
                ("Turing".to_string(), 0, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_without_signals() {
        let report = SqlStudentSignalsRepository::from_connection(testing::memory().await);
        assert!(report.all().await.unwrap().is_empty());
    }
}
