// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod apply;
pub mod init;
pub mod lookup;
pub mod queries;
pub mod status;

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::Serialize;

/// コマンドの出力
///
/// JSON出力はSerializeで、テキスト出力は `to_text` で生成する。
pub trait CommandOutput: Serialize {
    fn to_text(&self) -> String;
}

/// 出力フォーマットに応じて出力文字列を生成
pub fn render_output<T: CommandOutput>(output: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).with_context(|| "Failed to serialize output")
        }
    }
}
