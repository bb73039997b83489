use std::path::{
  Path,
  PathBuf
};

use serde::{
  Deserialize,
  Deserializer
};
use thiserror::Error;

#[derive(Debug, Error)]

pub enum ConfigError {
  #[error("config IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("config parse error: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("config invalid: {0}")]
  Invalid(String)
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]

pub enum AppMode {
  Dev,
  Prod
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]

pub enum SqlDialect {
  Sqlite,
  Postgres
}

/// Accepts the dialect name in any case
/// and with surrounding whitespace.
impl<'de> Deserialize<'de> for SqlDialect {
  fn deserialize<D: Deserializer<'de>>(
    deserializer: D
  ) -> Result<Self, D::Error> {
    let raw =
      String::deserialize(deserializer)?;

    match raw.trim().to_lowercase().as_str()
    {
      | "sqlite" => Ok(SqlDialect::Sqlite),
      | "postgres" => {
        Ok(SqlDialect::Postgres)
      }
      | other => {
        Err(serde::de::Error::custom(
          format!(
            "unknown database.dialect \
             '{other}'"
          )
        ))
      }
    }
  }
}

#[derive(Debug, Deserialize)]

pub struct ServerConfig {
  pub app:      AppConfig,
  pub http:     HttpConfig,
  pub database: DatabaseConfig,
  pub sqlite:   SqliteConfig,
  pub postgres: Option<PostgresConfig>,
  pub logging:  LoggingConfig,
  pub dev:      DevConfig,
  #[serde(default)]
  pub seed:     SeedConfig
}

#[derive(Debug, Deserialize)]

pub struct AppConfig {
  pub mode: AppMode
}

#[derive(Debug, Deserialize)]

pub struct HttpConfig {
  pub host: String,
  pub port: u16
}

#[derive(Debug, Deserialize)]

pub struct DatabaseConfig {
  pub dialect: SqlDialect
}

#[derive(Debug, Deserialize)]

pub struct SqliteConfig {
  pub path: String
}

#[derive(Debug, Clone, Deserialize)]

pub struct PostgresConfig {
  pub host:     String,
  pub port:     u16,
  pub database: String,
  pub user:     String,
  pub password: String,
  pub ssl_mode: String,
  pub schema:   String
}

#[derive(Debug, Deserialize)]

pub struct LoggingConfig {
  pub level: Option<String>
}

#[derive(Debug, Deserialize)]

pub struct DevConfig {
  pub reset_on_start: bool
}

/// Merchants inserted at startup when
/// no merchant with the same name exists.
#[derive(Debug, Default, Deserialize)]

pub struct SeedConfig {
  #[serde(default)]
  pub merchants: Vec<String>
}

impl ServerConfig {
  /// Reads `path` and the
  /// `schemas/server.schema.json` next
  /// to it.
  pub async fn load(
    path: &Path
  ) -> Result<Self, ConfigError> {
    let schema_path = path
      .parent()
      .ok_or_else(|| {
        ConfigError::Invalid(
          "config path has no parent"
            .into()
        )
      })?
      .join("schemas")
      .join("server.schema.json");

    let schema = tokio::fs::read_to_string(
      &schema_path
    )
    .await
    .map_err(|_| {
      ConfigError::Invalid(format!(
        "schema not found at {}",
        schema_path.display()
      ))
    })?;

    let content =
      tokio::fs::read_to_string(path)
        .await?;

    Self::parse(
      &schema,
      &content,
      &path.display().to_string()
    )
  }

  pub fn parse(
    schema: &str,
    content: &str,
    name: &str
  ) -> Result<Self, ConfigError> {
    let document: toml::Value =
      toml::from_str(content)?;

    check_schema(schema, &document, name)?;

    let config: ServerConfig =
      document.try_into()?;

    if config.database.dialect
      == SqlDialect::Postgres
    {
      config.postgres()?.schema_name()?;
    }

    Ok(config)
  }

  pub fn postgres(
    &self
  ) -> Result<&PostgresConfig, ConfigError>
  {
    self.postgres.as_ref().ok_or_else(
      || {
        ConfigError::Invalid(
          "database.dialect is postgres \
           but [postgres] is missing"
            .into()
        )
      }
    )
  }

  /// An empty `sqlite.path` falls back to
  /// `catalog.sqlite`. Relative paths
  /// resolve against `base_dir`.
  pub fn sqlite_path(
    &self,
    base_dir: &Path
  ) -> PathBuf {
    match self.sqlite.path.trim() {
      | "" => base_dir.join("catalog.sqlite"),
      | raw => base_dir.join(raw)
    }
  }
}

impl PostgresConfig {
  pub fn url(&self) -> String {
    format!(
      "postgres://{}:{}@{}:{}/{}?\
       sslmode={}",
      self.user,
      self.password,
      self.host,
      self.port,
      self.database,
      self.ssl_mode
    )
  }

  /// The `search_path` schema. Only ASCII
  /// alphanumerics and `_` are allowed.
  pub fn schema_name(
    &self
  ) -> Result<&str, ConfigError> {
    let name = self.schema.trim();

    let valid = !name.is_empty()
      && name.chars().all(|c| {
        c.is_ascii_alphanumeric()
          || c == '_'
      });

    if !valid {
      return Err(ConfigError::Invalid(
        format!(
          "invalid postgres.schema \
           '{name}'"
        )
      ));
    }

    Ok(name)
  }
}

/// Reports at most five schema violations.
fn check_schema(
  schema: &str,
  document: &toml::Value,
  name: &str
) -> Result<(), ConfigError> {
  let invalid = |what: &str, e: String| {
    ConfigError::Invalid(format!(
      "{what}: {e}"
    ))
  };

  let schema_json: serde_json::Value =
    serde_json::from_str(schema).map_err(
      |e| invalid("schema parse", e.to_string())
    )?;

  let validator =
    jsonschema::validator_for(&schema_json)
      .map_err(|e| {
        invalid("schema compile", e.to_string())
      })?;

  let instance =
    serde_json::to_value(document).map_err(
      |e| invalid(name, e.to_string())
    )?;

  let violations: Vec<String> = validator
    .iter_errors(&instance)
    .take(5)
    .map(|e| e.to_string())
    .collect();

  if violations.is_empty() {
    return Ok(());
  }

  Err(invalid(
    &format!("{name} does not match schema"),
    violations.join("; ")
  ))
}
