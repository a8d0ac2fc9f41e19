//! Data access for students and their lesson signals
//!
//! One pool to `ConnectionStrings:BotDatabase` is opened at startup and
//! shared by the three repositories, so they all see the same database even
//! when it is in-memory SQLite. Controllers receive them as `Arc<dyn ...>`
//! constants.

mod lesson_signal;
mod student;
mod student_signals;

pub use lesson_signal::{LessonSignalRepository, SqlLessonSignalRepository};
pub use student::{SqlStudentRepository, StudentRepository};
pub use student_signals::{SqlStudentSignalsRepository, StudentSignalsRepository};

use crate::models::entities::{lesson_signal as lesson_signal_entity, student as student_entity};
use kit::database::DatabaseConfig;
use kit::{Configuration, DbConnection, FrameworkError};
use sea_orm::{ConnectionTrait, EntityTrait, Schema};
use std::path::Path;

/// Connection string name used by every repository
pub const CONNECTION_NAME: &str = "BotDatabase";

/// Open a pool for `ConnectionStrings:BotDatabase` and create missing tables
///
/// Relative SQLite paths are resolved against `content_root`.
pub async fn connect(config: &Configuration, content_root: &Path) -> Result<DbConnection, FrameworkError> {
    let database = DatabaseConfig::from_configuration(config, CONNECTION_NAME)?.relative_to(content_root);
    let conn = DbConnection::connect(&database).await?;
    ensure_schema(&conn).await?;
    Ok(conn)
}

/// Create the `student` and `lesson_signal` tables if they are missing
pub async fn ensure_schema(conn: &DbConnection) -> Result<(), FrameworkError> {
    create_table(conn, student_entity::Entity).await?;
    create_table(conn, lesson_signal_entity::Entity).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(conn: &DbConnection, entity: E) -> Result<(), FrameworkError> {
    let backend = conn.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    statement.if_not_exists();
    conn.execute(backend.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub async fn memory() -> DbConnection {
        let config = DatabaseConfig::builder().url("sqlite::memory:").build();
        let conn = DbConnection::connect(&config).await.unwrap();
        ensure_schema(&conn).await.unwrap();
        conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_schema_is_repeatable() {
        let conn = testing::memory().await;
        ensure_schema(&conn).await.unwrap();
        assert_eq!(student_entity::Entity::find().all(conn.inner()).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_connect_requires_connection_string() {
        let config = Configuration::builder().build().unwrap();
        assert!(matches!(
            connect(&config, Path::new(".")).await,
            Err(FrameworkError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_relative_sqlite_file_lands_under_content_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration::builder()
            .add_in_memory([("ConnectionStrings:BotDatabase", "sqlite://./data/ucubot.db")])
            .build()
            .unwrap();

        connect(&config, dir.path()).await.unwrap();
        assert!(dir.path().join("data/ucubot.db").is_file());
    }
}
