// 設定ファイル管理
//
// プロジェクトの設定ファイル（YAML形式）の構造定義と検証、
// 環境別のデータベース接続設定の管理を行います。

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::naming;

/// データベース方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(rename = "postgresql", alias = "postgres")]
    PostgreSQL,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlite")]
    SQLite,
}

impl Dialect {
    /// 方言ごとの既定ポート
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Dialect::PostgreSQL => Some(5432),
            Dialect::MySQL => Some(3306),
            Dialect::SQLite => None,
        }
    }

    /// n番目（1始まり）の位置パラメータのプレースホルダー
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::PostgreSQL | Dialect::SQLite => format!("${}", index),
            Dialect::MySQL => "?".to_string(),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::SQLite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgresql" | "postgres" => Ok(Dialect::PostgreSQL),
            "mysql" => Ok(Dialect::MySQL),
            "sqlite" => Ok(Dialect::SQLite),
            other => Err(anyhow!(
                "Unsupported database dialect: {}. Please specify one of: postgresql, mysql, sqlite.",
                other
            )),
        }
    }
}

/// プロジェクト設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,

    /// データベース方言
    pub dialect: Dialect,

    /// マイグレーションディレクトリ
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// 名前付きクエリのディレクトリ
    #[serde(default = "default_queries_dir")]
    pub queries_dir: PathBuf,

    /// 環境別のデータベース設定
    pub environments: HashMap<String, DatabaseConfig>,
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from(naming::MIGRATIONS_DIR)
}

fn default_queries_dir() -> PathBuf {
    PathBuf::from(naming::QUERIES_DIR)
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = naming::CONFIG_FILE;

    /// 指定された環境のデータベース設定を取得
    pub fn get_database_config(&self, environment: &str) -> Result<DatabaseConfig> {
        self.environments.get(environment).cloned().ok_or_else(|| {
            let mut available: Vec<_> = self.environments.keys().collect();
            available.sort();
            anyhow!(
                "Environment '{}' not found. Available environments: {:?}",
                environment,
                available
            )
        })
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(anyhow!("Config file version is not specified"));
        }

        if self.environments.is_empty() {
            return Err(anyhow!(
                "At least one environment configuration is required"
            ));
        }

        for (env_name, db_config) in &self.environments {
            db_config
                .validate()
                .with_context(|| format!("Invalid config for environment '{}'", env_name))?;
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

/// データベース接続設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// ホスト名（SQLiteの場合は不要）
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号（未指定時は方言の既定値）
    #[serde(default)]
    pub port: Option<u16>,

    /// データベース名（SQLiteの場合はファイルパス）
    pub database: String,

    /// ユーザー名
    #[serde(default)]
    pub user: Option<String>,

    /// パスワード
    #[serde(default)]
    pub password: Option<String>,

    /// 接続タイムアウト（秒）
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl DatabaseConfig {
    /// データベース設定を検証
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(anyhow!("Database name is not specified"));
        }

        Ok(())
    }

    /// 方言を考慮した実際のポート番号
    pub fn effective_port(&self, dialect: Dialect) -> Option<u16> {
        self.port.or_else(|| dialect.default_port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version: "1.0"
dialect: postgresql
environments:
  development:
    host: localhost
    port: 5432
    database: credstore_dev
    user: postgres
    password: secret
  test:
    database: test.db
"#;

    #[test]
    fn test_dialect_display_and_parse() {
        assert_eq!(Dialect::PostgreSQL.to_string(), "postgresql");
        assert_eq!(Dialect::MySQL.to_string(), "mysql");
        assert_eq!(Dialect::SQLite.to_string(), "sqlite");

        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::PostgreSQL);
        assert_eq!("sqlite".parse::<Dialect>().unwrap(), Dialect::SQLite);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_placeholder_per_dialect() {
        assert_eq!(Dialect::PostgreSQL.placeholder(2), "$2");
        assert_eq!(Dialect::SQLite.placeholder(1), "$1");
        assert_eq!(Dialect::MySQL.placeholder(3), "?");
    }

    #[test]
    fn test_parse_config_with_defaults() {
        let config: Config = SAMPLE.parse().unwrap();

        assert_eq!(config.dialect, Dialect::PostgreSQL);
        assert_eq!(config.migrations_dir, PathBuf::from("migrations"));
        assert_eq!(config.queries_dir, PathBuf::from("queries"));
        assert!(config.validate().is_ok());

        let test_env = config.get_database_config("test").unwrap();
        assert_eq!(test_env.host, "localhost");
        assert_eq!(test_env.port, None);
        assert_eq!(test_env.effective_port(Dialect::PostgreSQL), Some(5432));
        assert_eq!(test_env.effective_port(Dialect::SQLite), None);
    }

    #[test]
    fn test_unknown_environment_lists_available() {
        let config: Config = SAMPLE.parse().unwrap();
        let err = config.get_database_config("production").unwrap_err();

        let message = err.to_string();
        assert!(message.contains("production"));
        assert!(message.contains("development"));
    }

    #[test]
    fn test_validate_rejects_empty_environments() {
        let config: Config = "version: \"1.0\"\ndialect: sqlite\nenvironments: {}\n"
            .parse()
            .unwrap();
        assert!(config.validate().is_err());
    }
}
