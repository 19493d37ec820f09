// queriesコマンドハンドラー
//
// クエリカタログの内容（名前とパラメータ数）を一覧表示する。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::services::query_catalog::QueryCatalog;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

/// queriesコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct QueriesCommand {
    pub project_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryEntry {
    pub name: String,
    pub parameter_count: usize,
}

/// queriesコマンドの出力
#[derive(Debug, Clone, Serialize)]
pub struct QueriesOutput {
    pub queries: Vec<QueryEntry>,
}

impl QueriesOutput {
    pub fn from_catalog(catalog: &QueryCatalog) -> Self {
        Self {
            queries: catalog
                .queries()
                .map(|q| QueryEntry {
                    name: q.name.clone(),
                    parameter_count: q.parameter_count(),
                })
                .collect(),
        }
    }
}

impl CommandOutput for QueriesOutput {
    fn to_text(&self) -> String {
        if self.queries.is_empty() {
            return "No queries found.".to_string();
        }

        let width = self.queries.iter().map(|q| q.name.len()).max().unwrap_or(0);
        let mut text = format!("{:<width$}  Parameters\n", "Name", width = width);
        for query in &self.queries {
            text.push_str(&format!(
                "{:<width$}  {}\n",
                query.name,
                query.parameter_count,
                width = width
            ));
        }
        text.trim_end().to_string()
    }
}

/// queriesコマンドハンドラー
#[derive(Debug, Default)]
pub struct QueriesCommandHandler {}

impl QueriesCommandHandler {
    pub fn new() -> Self {
        Self {}
    }

    /// queriesコマンドを実行
    pub fn execute(&self, command: &QueriesCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let catalog = context.query_catalog()?;
        render_output(&QueriesOutput::from_catalog(&catalog), command.format)
    }
}
