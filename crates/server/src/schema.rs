use std::path::Path;

use sqlx::{Pool, Postgres, Sqlite};
use tokio::fs;

use crate::config::ConfigError;
use crate::db::Database;

pub async fn apply_server_schema(db: &Database, config_path: &Path) -> Result<(), ConfigError> {
    let base_dir = config_path
        .parent()
        .ok_or_else(|| ConfigError::Invalid("config path has no parent".into()))?;
    match db {
        Database::Sqlite(pool) => {
            let schema_path = base_dir.join("sql").join("sqlite").join("schema.sql");
            let content = read_schema(&schema_path).await?;
            execute_schema_sqlite(pool, &content).await?;
        }
        Database::Postgres(pool) => {
            let schema_path = base_dir.join("sql").join("postgres").join("schema.sql");
            let content = read_schema(&schema_path).await?;
            execute_schema_postgres(pool, &content).await?;
        }
    }
    tracing::info!("catalog schema applied");
    Ok(())
}

async fn read_schema(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path)
        .await
        .map_err(|_| ConfigError::Invalid(format!("schema not found at {}", path.display())))
}

fn statements(content: &str) -> impl Iterator<Item = &str> {
    content.split(';').map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) async fn execute_schema_sqlite(
    pool: &Pool<Sqlite>,
    content: &str,
) -> Result<(), ConfigError> {
    for stmt in statements(content) {
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| ConfigError::Invalid(format!("schema apply error: {e}")))?;
    }
    Ok(())
}

pub(crate) async fn execute_schema_postgres(
    pool: &Pool<Postgres>,
    content: &str,
) -> Result<(), ConfigError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| ConfigError::Invalid(format!("schema apply error: {e}")))?;

    for stmt in statements(content) {
        sqlx::query(stmt)
            .execute(&mut *conn)
            .await
            .map_err(|e| ConfigError::Invalid(format!("schema apply error: {e}")))?;
    }
    Ok(())
}
