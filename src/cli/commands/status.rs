// statusコマンドハンドラー
//
// マイグレーション状態の確認機能を実装します。
// - 履歴テーブルの読み込み（テーブルは作成しない）
// - ローカルマイグレーションファイルとの照合
// - 適用済み/未適用/孤立/チェックサム不一致の表示

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::migration::{MigrationStatus, MigrationStatusEntry};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// statusコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct StatusCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 環境名
    pub env: String,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// ステータスサマリー
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub applied: usize,
    pub pending: usize,
    pub orphaned: usize,
    pub checksum_mismatch: usize,
}

impl StatusSummary {
    pub fn from_entries(entries: &[MigrationStatusEntry]) -> Self {
        let count = |status: MigrationStatus| entries.iter().filter(|e| e.status == status).count();
        Self {
            total: entries.len(),
            applied: entries.iter().filter(|e| e.status.is_applied()).count(),
            pending: count(MigrationStatus::Pending),
            orphaned: count(MigrationStatus::Orphaned),
            checksum_mismatch: count(MigrationStatus::AppliedChecksumMismatch),
        }
    }
}

/// statusコマンドの出力
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    pub migrations: Vec<MigrationStatusEntry>,
    pub summary: StatusSummary,
}

impl CommandOutput for StatusOutput {
    fn to_text(&self) -> String {
        if self.migrations.is_empty() {
            return "No migrations found.".to_string();
        }

        let mut text = String::from("Migration Status\n\n");
        text.push_str(&format!("{:<16} {:<28} {}\n", "Version", "Status", "Description"));
        text.push_str(&format!("{}\n", "-".repeat(72)));

        for entry in &self.migrations {
            let label = format!("{:<28}", entry.status.label());
            let label = match entry.status {
                MigrationStatus::Applied => label.green(),
                MigrationStatus::Pending => label.yellow(),
                MigrationStatus::Orphaned | MigrationStatus::AppliedChecksumMismatch => label.red(),
            };
            text.push_str(&format!("{:<16} {} {}\n", entry.version, label, entry.description));
        }

        text.push_str(&format!(
            "\nTotal: {}, Applied: {}, Pending: {}",
            self.summary.total, self.summary.applied, self.summary.pending
        ));
        if self.summary.orphaned > 0 {
            text.push_str(&format!(", Orphaned: {}", self.summary.orphaned));
        }
        if self.summary.checksum_mismatch > 0 {
            text.push_str(&format!(
                "\n{} {} applied migration(s) were modified after being applied",
                "Warning:".yellow(),
                self.summary.checksum_mismatch
            ));
        }
        text
    }
}

/// statusコマンドハンドラー
#[derive(Debug, Default)]
pub struct StatusCommandHandler {}

impl StatusCommandHandler {
    /// 新しいStatusCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// statusコマンドを実行
    pub async fn execute(&self, command: &StatusCommand) -> Result<String> {
        let output = self.run(command).await?;
        render_output(&output, command.format)
    }

    /// statusコマンドを実行し、出力構造体を返す
    pub async fn run(&self, command: &StatusCommand) -> Result<StatusOutput> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let store = context.schema_store()?;
        let pool = context.connect_pool(&command.env).await?;

        let migrations = store
            .status(&pool)
            .await
            .with_context(|| "Failed to read migration status")?;
        pool.close().await;

        Ok(StatusOutput {
            summary: StatusSummary::from_entries(&migrations),
            migrations,
        })
    }
}
