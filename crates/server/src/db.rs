use std::path::Path;

use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{
  SqliteConnectOptions,
  SqlitePoolOptions
};
use sqlx::{
  PgPool,
  SqlitePool
};

use crate::app_state::AppState;
use crate::config::{
  ConfigError,
  ServerConfig,
  SqlDialect
};
use crate::repo::{
  PostgresRepo,
  SqliteRepo
};

pub enum Database {
  Sqlite(SqlitePool),
  Postgres(PgPool)
}

impl Database {
  pub fn state(&self) -> AppState {
    match self {
      | Database::Sqlite(pool) => {
        AppState::new(SqliteRepo::new(
          pool.clone()
        ))
      }
      | Database::Postgres(pool) => {
        AppState::new(PostgresRepo::new(
          pool.clone()
        ))
      }
    }
  }
}

pub async fn connect_db(
  config: &ServerConfig,
  config_path: &Path
) -> Result<Database, ConfigError> {
  match config.database.dialect {
    | SqlDialect::Sqlite => {
      let base_dir = config_path
        .parent()
        .ok_or_else(|| {
          ConfigError::Invalid(
            "config path has no parent"
              .into()
          )
        })?;

      let path =
        config.sqlite_path(base_dir);

      if let Some(parent) = path
        .parent()
        .filter(|p| {
          !p.as_os_str().is_empty()
        })
      {
        tokio::fs::create_dir_all(parent)
          .await?;
      }

      let options =
        SqliteConnectOptions::new()
          .filename(&path)
          .create_if_missing(true)
          .foreign_keys(true);

      let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .map_err(|e| {
          ConfigError::Invalid(format!(
            "sqlite connect failed: {e}"
          ))
        })?;

      tracing::info!(
        path = %path.display(),
        "sqlite catalog opened"
      );

      Ok(Database::Sqlite(pool))
    }
    | SqlDialect::Postgres => {
      let pg = config.postgres()?;
      let schema =
        pg.schema_name()?.to_string();

      let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(set_search_path(
          schema.clone()
        ))
        .connect(&pg.url())
        .await
        .map_err(|e| {
          ConfigError::Invalid(format!(
            "postgres connect failed: \
             {e}"
          ))
        })?;

      tracing::info!(
        host = %pg.host,
        schema = %schema,
        "postgres catalog opened"
      );

      Ok(Database::Postgres(pool))
    }
  }
}

/// Wipes every catalog row. Items go first
/// so the foreign key never blocks.
pub async fn reset_catalog_data(
  db: &Database
) -> Result<(), ConfigError> {
  let tables = ["items", "merchants"];

  match db {
    | Database::Sqlite(pool) => {
      for table in tables {
        let query = format!(
          "DELETE FROM {table}"
        );

        if let Err(e) =
          sqlx::query(&query)
            .execute(pool)
            .await
          && !is_missing_table_error(&e)
        {
          return Err(
            ConfigError::Invalid(
              format!(
                "cleanup {table} \
                 failed: {e}"
              )
            )
          );
        }
      }
    }
    | Database::Postgres(pool) => {
      let table_list = tables
        .iter()
        .map(|t| quote_ident(t))
        .collect::<Vec<_>>()
        .join(", ");

      let stmt = format!(
        "TRUNCATE TABLE {table_list} \
         RESTART IDENTITY CASCADE"
      );

      if let Err(e) = sqlx::query(&stmt)
        .execute(pool)
        .await
        && !is_missing_table_error(&e)
      {
        return Err(
          ConfigError::Invalid(
            format!(
              "cleanup failed: {e}"
            )
          )
        );
      }
    }
  }

  tracing::warn!("catalog data reset");

  Ok(())
}

/// Creates each named merchant unless one
/// with exactly that name already exists.
pub async fn seed_merchants(
  state: &AppState,
  names: &[String]
) -> Result<usize, ConfigError> {
  let mut created = 0;

  for name in names {
    let existing = state
      .merchants
      .find_merchants_by_name(name)
      .await
      .map_err(|e| {
        ConfigError::Invalid(format!(
          "seed lookup failed: {e}"
        ))
      })?;

    if existing
      .iter()
      .any(|m| &m.name == name)
    {
      continue;
    }

    state
      .merchants
      .create_merchant(name)
      .await
      .map_err(|e| {
        ConfigError::Invalid(format!(
          "seed merchant '{name}' \
           failed: {e}"
        ))
      })?;

    created += 1;
  }

  if created > 0 {
    tracing::info!(
      created,
      "seed merchants created"
    );
  }

  Ok(created)
}

#[allow(clippy::type_complexity)]
pub fn set_search_path(
  schema: String
) -> impl Fn(
  &mut sqlx::PgConnection,
  sqlx::pool::PoolConnectionMetadata
) -> std::pin::Pin<
  Box<
    dyn std::future::Future<
        Output = Result<
          (),
          sqlx::Error
        >
      > + Send
      + '_
  >
> {
  move |conn, _meta| {
    let schema_ident =
      quote_ident(&schema);

    Box::pin(async move {
      let create_stmt = format!(
        "CREATE SCHEMA IF NOT EXISTS \
         {schema_ident}"
      );

      sqlx::query(&create_stmt)
        .execute(&mut *conn)
        .await?;

      let search_stmt = format!(
        "SET search_path TO \
         {schema_ident}"
      );

      sqlx::query(&search_stmt)
        .execute(&mut *conn)
        .await?;

      Ok(())
    })
  }
}

fn is_missing_table_error(
  e: &sqlx::Error
) -> bool {
  matches!(
      e,
      sqlx::Error::Database(db_err)
        if db_err.code().as_deref() == Some("42P01")
  )
}

pub fn quote_ident(
  name: &str
) -> String {
  format!(
    "\"{}\"",
    name.replace('"', "\"\"")
  )
}
