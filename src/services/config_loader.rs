// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oと環境変数の参照はこのサービスに集約する。

use crate::core::config::{Config, DatabaseConfig};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// 接続設定を上書きする環境変数
pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_DATABASE: &str = "DB_DATABASE";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込み、検証する
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Config::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 環境変数 `DB_*` で接続設定を上書きする
    pub fn apply_env_overrides(config: DatabaseConfig) -> Result<DatabaseConfig> {
        Self::apply_overrides_with(config, |key| std::env::var(key).ok())
    }

    /// 任意の値取得関数で接続設定を上書きする
    ///
    /// 空文字列の値は未設定として扱います。
    pub fn apply_overrides_with<F>(mut config: DatabaseConfig, lookup: F) -> Result<DatabaseConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(host) = get(ENV_DB_HOST) {
            debug!(key = ENV_DB_HOST, "Overriding database host from environment");
            config.host = host;
        }
        if let Some(port) = get(ENV_DB_PORT) {
            let port = port
                .parse::<u16>()
                .map_err(|_| anyhow!("Invalid {} value: '{}'", ENV_DB_PORT, port))?;
            config.port = Some(port);
        }
        if let Some(database) = get(ENV_DB_DATABASE) {
            config.database = database;
        }
        if let Some(user) = get(ENV_DB_USER) {
            config.user = Some(user);
        }
        if let Some(password) = get(ENV_DB_PASSWORD) {
            config.password = Some(password);
        }

        Ok(config)
    }
}
