// applyコマンドハンドラー
//
// マイグレーションの適用機能を実装します。
// - データベース接続の確立
// - 未適用マイグレーションの検出と参照先テーブルの確認
// - マイグレーションの順次実行（トランザクション内）
// - 実行結果の表示

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::migration::AppliedMigration;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// applyコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ApplyCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// Dry run - 実行せずにSQLを表示
    pub dry_run: bool,
    /// 対象環境
    pub env: String,
    /// タイムアウト（秒）
    pub timeout: Option<u64>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// dry run で表示する未適用マイグレーション
#[derive(Debug, Clone, Serialize)]
pub struct PendingMigration {
    pub version: String,
    pub description: String,
    pub sql: String,
}

/// applyコマンドの出力
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutput {
    pub dry_run: bool,
    pub applied: Vec<AppliedMigration>,
    pub pending: Vec<PendingMigration>,
    pub warnings: Vec<String>,
    pub total_duration_ms: i64,
}

impl CommandOutput for ApplyOutput {
    fn to_text(&self) -> String {
        let mut text = String::new();
        for warning in &self.warnings {
            text.push_str(&format!("{} {}\n", "Warning:".yellow(), warning));
        }

        if self.dry_run {
            text.push_str("=== DRY RUN MODE ===\n");
            if self.pending.is_empty() {
                text.push_str("No pending migrations.");
                return text;
            }
            text.push_str(&format!(
                "The following {} migration(s) will be applied:\n",
                self.pending.len()
            ));
            for migration in &self.pending {
                text.push_str(&format!(
                    "\n\u{25b6} {} - {}\n{}\n",
                    migration.version,
                    migration.description,
                    migration.sql.trim_end()
                ));
            }
            return text.trim_end().to_string();
        }

        if self.applied.is_empty() {
            text.push_str("No pending migrations. Database is up to date.");
            return text;
        }

        text.push_str("=== Migration Apply Complete ===\n");
        text.push_str(&format!("{} migration(s) applied:\n\n", self.applied.len()));
        for migration in &self.applied {
            text.push_str(&format!(
                "{} {} - {} ({}ms)\n",
                "✓".green(),
                migration.version,
                migration.description,
                migration.duration_ms
            ));
        }
        text.push_str(&format!("\nTotal execution time: {}ms", self.total_duration_ms));
        text
    }
}

/// applyコマンドハンドラー
#[derive(Debug, Default)]
pub struct ApplyCommandHandler {}

impl ApplyCommandHandler {
    /// 新しいApplyCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// applyコマンドを実行
    pub async fn execute(&self, command: &ApplyCommand) -> Result<String> {
        let output = self.run(command).await?;
        render_output(&output, command.format)
    }

    /// applyコマンドを実行し、出力構造体を返す
    pub async fn run(&self, command: &ApplyCommand) -> Result<ApplyOutput> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let store = context.schema_store()?;
        debug!(count = store.migrations().len(), "Loaded local migrations");

        let pool = context
            .connect_pool_with_timeout(&command.env, command.timeout)
            .await?;

        if command.dry_run {
            let history = store
                .history(&pool)
                .await
                .with_context(|| "Failed to read migration history")?;
            store.verify_references(&pool, &history).await?;

            let pending = store
                .pending(&history)
                .into_iter()
                .map(|m| PendingMigration {
                    version: m.version.clone(),
                    description: m.description.clone(),
                    sql: m.sql.clone(),
                })
                .collect();

            return Ok(ApplyOutput {
                dry_run: true,
                applied: Vec::new(),
                pending,
                warnings: store.checksum_warnings(&history),
                total_duration_ms: 0,
            });
        }

        let report = store.apply(&pool).await?;
        pool.close().await;

        Ok(ApplyOutput {
            dry_run: false,
            total_duration_ms: report.total_duration_ms(),
            applied: report.applied,
            pending: Vec::new(),
            warnings: report.warnings,
        })
    }
}
