// コマンド共通コンテキスト
//
// 設定ファイル読み込みやパス解決、DB接続の重複をCLI層で集約する。

use crate::adapters::database::DatabaseConnectionService;
use crate::core::config::{Config, DatabaseConfig, Dialect};
use crate::services::config_loader::ConfigLoader;
use crate::services::query_catalog::QueryCatalog;
use crate::services::schema_store::SchemaStore;
use anyhow::{anyhow, Context, Result};
use sqlx::AnyPool;
use std::path::PathBuf;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = custom_config_path
            .unwrap_or_else(|| project_path.join(Config::DEFAULT_CONFIG_PATH));

        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Please initialize the project first with the `init` command.",
                config_path
            ));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to read config file")?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// データベース方言を取得
    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// マイグレーションディレクトリの絶対パス
    pub fn migrations_dir(&self) -> PathBuf {
        self.project_path.join(&self.config.migrations_dir)
    }

    /// クエリディレクトリの絶対パス
    pub fn queries_dir(&self) -> PathBuf {
        self.project_path.join(&self.config.queries_dir)
    }

    /// マイグレーションディレクトリが存在することを確認して返す
    pub fn require_migrations_dir(&self) -> Result<PathBuf> {
        let path = self.migrations_dir();
        if !path.exists() {
            return Err(anyhow!("Migrations directory not found: {:?}", path));
        }
        Ok(path)
    }

    /// クエリディレクトリが存在することを確認して返す
    pub fn require_queries_dir(&self) -> Result<PathBuf> {
        let path = self.queries_dir();
        if !path.exists() {
            return Err(anyhow!("Queries directory not found: {:?}", path));
        }
        Ok(path)
    }

    /// プロジェクトのマイグレーションからスキーマストアを作成
    pub fn schema_store(&self) -> Result<SchemaStore> {
        let dir = self.require_migrations_dir()?;
        SchemaStore::from_dir(self.dialect(), &dir)
            .with_context(|| format!("Failed to load migrations from {:?}", dir))
    }

    /// プロジェクトのクエリからカタログを作成
    pub fn query_catalog(&self) -> Result<QueryCatalog> {
        let dir = self.require_queries_dir()?;
        QueryCatalog::load_dir(&dir)
            .with_context(|| format!("Failed to load queries from {:?}", dir))
    }

    /// 環境に応じたデータベース設定を取得（環境変数上書き込み）
    ///
    /// SQLiteの相対パスはプロジェクトルートからの相対として解決します。
    pub fn database_config(&self, env: &str) -> Result<DatabaseConfig> {
        let config = self
            .config
            .get_database_config(env)
            .with_context(|| format!("Config for environment '{}' not found", env))?;
        let mut config = ConfigLoader::apply_env_overrides(config)?;

        if self.dialect() == Dialect::SQLite && config.database != ":memory:" {
            let path = PathBuf::from(&config.database);
            if path.is_relative() {
                config.database = self.project_path.join(path).display().to_string();
            }
        }

        Ok(config)
    }

    /// タイムアウト付きで接続プールを作成
    pub async fn connect_pool_with_timeout(
        &self,
        env: &str,
        timeout: Option<u64>,
    ) -> Result<AnyPool> {
        let db_config = self.database_config(env)?;
        DatabaseConnectionService::new()
            .create_pool(self.dialect(), &db_config, timeout)
            .await
            .with_context(|| "Failed to connect to database")
    }

    /// 接続プールを作成
    pub async fn connect_pool(&self, env: &str) -> Result<AnyPool> {
        self.connect_pool_with_timeout(env, None).await
    }
}
