// lookupコマンドハンドラー
//
// get-user-by-mail クエリでアカウントを検索する。
// 見つからないことはエラーではなく、その旨を出力する。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::account::Account;
use crate::services::account_repository::AccountRepository;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

/// lookupコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct LookupCommand {
    pub project_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub email: String,
    pub env: String,
    pub format: OutputFormat,
}

/// lookupコマンドの出力
#[derive(Debug, Clone, Serialize)]
pub struct LookupOutput {
    pub email: String,
    pub account: Option<Account>,
}

impl CommandOutput for LookupOutput {
    fn to_text(&self) -> String {
        match &self.account {
            Some(account) => serde_json::to_string_pretty(account)
                .unwrap_or_else(|_| format!("{:?}", account)),
            None => format!("No account found for {}", self.email),
        }
    }
}

/// lookupコマンドハンドラー
#[derive(Debug, Default)]
pub struct LookupCommandHandler {}

impl LookupCommandHandler {
    pub fn new() -> Self {
        Self {}
    }

    /// lookupコマンドを実行
    pub async fn execute(&self, command: &LookupCommand) -> Result<String> {
        let output = self.run(command).await?;
        render_output(&output, command.format)
    }

    /// lookupコマンドを実行し、出力構造体を返す
    pub async fn run(&self, command: &LookupCommand) -> Result<LookupOutput> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let catalog = context.query_catalog()?;
        let pool = context.connect_pool(&command.env).await?;

        let account = AccountRepository::new(&pool, &catalog)
            .get_by_mail(&command.email)
            .await
            .with_context(|| format!("Failed to look up account '{}'", command.email))?;
        pool.close().await;

        Ok(LookupOutput {
            email: command.email.clone(),
            account,
        })
    }
}
