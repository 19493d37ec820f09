// initコマンドハンドラー
//
// プロジェクトの初期化処理を実装します。
// - 設定ファイルの生成（.credstore.yaml）
// - 同梱マイグレーションとクエリの書き出し（migrations/, queries/）
// - 初期化済みプロジェクトの検出

use crate::cli::commands::CommandOutput;
use crate::core::config::{Config, DatabaseConfig, Dialect};
use crate::core::naming;
use crate::services::bundled::{bundled_migrations, bundled_queries, BundledFile};
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// initコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct InitCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// データベース方言
    pub dialect: Dialect,
    /// データベース名（未指定時は方言ごとの既定値）
    pub database: Option<String>,
    /// 強制的に初期化（既存の設定と同梱ファイルを上書き）
    pub force: bool,
}

/// initコマンドの出力
#[derive(Debug, Clone, Serialize)]
pub struct InitOutput {
    pub config_path: PathBuf,
    pub dialect: Dialect,
    /// 書き出したマイグレーション（ファイル名）
    pub migrations: Vec<String>,
    /// 書き出したクエリ（ディレクトリからの相対パス）
    pub queries: Vec<String>,
}

impl CommandOutput for InitOutput {
    fn to_text(&self) -> String {
        let mut text = format!(
            "{} Initialized {} project ({})\n",
            "✓".green(),
            naming::APP_NAME,
            self.dialect
        );
        text.push_str(&format!("  config:     {}\n", self.config_path.display()));
        text.push_str(&format!("  migrations: {} file(s)\n", self.migrations.len()));
        text.push_str(&format!("  queries:    {} file(s)", self.queries.len()));
        if self.migrations.is_empty() {
            text.push_str(&format!(
                "\n{} No bundled files for {}; add migrations and queries manually.",
                "Warning:".yellow(),
                self.dialect
            ));
        }
        text
    }
}

/// initコマンドハンドラー
#[derive(Debug, Default)]
pub struct InitCommandHandler {}

impl InitCommandHandler {
    /// 新しいInitCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// initコマンドを実行
    pub fn execute(&self, command: &InitCommand) -> Result<InitOutput> {
        if self.is_already_initialized(&command.project_path) && !command.force {
            return Err(anyhow!(
                "Project is already initialized. Use --force option to force re-initialization."
            ));
        }

        let config = self.default_config(command.dialect, command.database.clone());
        let config_path = command.project_path.join(Config::DEFAULT_CONFIG_PATH);
        let yaml = serde_saphyr::to_string(&config)
            .with_context(|| "Failed to serialize config file")?;
        fs::write(&config_path, yaml)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        let migrations_dir = command.project_path.join(&config.migrations_dir);
        let queries_dir = command.project_path.join(&config.queries_dir);

        let migrations = self.write_files(
            &migrations_dir,
            bundled_migrations(command.dialect).unwrap_or_default(),
            command.force,
        )?;
        let queries = self.write_files(
            &queries_dir,
            bundled_queries(command.dialect).unwrap_or_default(),
            command.force,
        )?;

        if migrations.is_empty() {
            warn!(dialect = %command.dialect, "No bundled migrations for dialect");
        }

        Ok(InitOutput {
            config_path,
            dialect: command.dialect,
            migrations,
            queries,
        })
    }

    /// プロジェクトが既に初期化されているかチェック
    pub fn is_already_initialized(&self, project_path: &Path) -> bool {
        project_path.join(Config::DEFAULT_CONFIG_PATH).exists()
    }

    /// 既定の設定（development環境のみ）
    pub fn default_config(&self, dialect: Dialect, database: Option<String>) -> Config {
        let database = database.unwrap_or_else(|| match dialect {
            Dialect::SQLite => format!("{}.db", naming::APP_NAME),
            Dialect::PostgreSQL | Dialect::MySQL => naming::APP_NAME.to_string(),
        });

        let db_config = DatabaseConfig {
            host: "localhost".to_string(),
            port: None,
            database,
            user: None,
            password: None,
            timeout: Some(30),
        };

        Config {
            version: "1.0".to_string(),
            dialect,
            migrations_dir: PathBuf::from(naming::MIGRATIONS_DIR),
            queries_dir: PathBuf::from(naming::QUERIES_DIR),
            environments: HashMap::from([("development".to_string(), db_config)]),
        }
    }

    /// 同梱ファイルをディレクトリへ書き出す
    ///
    /// 既存のファイルは `force` が無い限り上書きしません。
    fn write_files(&self, dir: &Path, files: &[BundledFile], force: bool) -> Result<Vec<String>> {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))?;

        let mut written = Vec::new();
        for file in files {
            let path = dir.join(file.path);
            if path.exists() && !force {
                debug!(path = %path.display(), "Keeping existing file");
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
            fs::write(&path, file.contents)
                .with_context(|| format!("Failed to write file: {:?}", path))?;
            written.push(file.path.to_string());
        }

        Ok(written)
    }
}
