// データベース接続アダプター
//
// SQLxのAnyドライバを使用したデータベース接続の管理を行います。
// PostgreSQL、MySQL、SQLiteに対応した統一されたインターフェースを提供します。

use crate::adapters::connection_string::build_connection_string;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::DatabaseError;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use std::time::Duration;
use tracing::debug;

/// 既定の接続取得タイムアウト（秒）
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// 接続プールの最大接続数
const MAX_CONNECTIONS: u32 = 5;

/// データベース接続サービス
///
/// データベース接続プールの初期化と管理を行います。
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 設定からデータベース接続プールを作成
    ///
    /// `timeout_override` が指定された場合は設定ファイルの値より優先します。
    pub async fn create_pool(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
        timeout_override: Option<u64>,
    ) -> Result<AnyPool, DatabaseError> {
        let connection_string = build_connection_string(dialect, config)?;
        let timeout = timeout_override.or(config.timeout);
        debug!(
            dialect = %dialect,
            host = %config.host,
            database = %config.database,
            "Connecting to database"
        );

        self.connect_url(&connection_string, timeout)
            .await
            .map_err(|e| match e {
                DatabaseError::Connection { cause, .. } => DatabaseError::Connection {
                    message: format!("Failed to create connection pool for {}", dialect),
                    cause,
                },
                other => other,
            })
    }

    /// 接続URLから直接プールを作成
    pub async fn connect_url(
        &self,
        url: &str,
        timeout_secs: Option<u64>,
    ) -> Result<AnyPool, DatabaseError> {
        sqlx::any::install_default_drivers();

        let in_memory = url.starts_with("sqlite::memory:");
        let pool_options = self.create_pool_options(timeout_secs, in_memory);

        pool_options
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Connection {
                message: "Failed to create connection pool".to_string(),
                cause: e.to_string(),
            })
    }

    /// 接続テストを実行
    pub async fn test_connection(&self, pool: &AnyPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Connection {
                message: "Database connection test failed".to_string(),
                cause: e.to_string(),
            })
    }

    /// プールオプションを作成
    ///
    /// インメモリSQLiteは接続ごとに別のデータベースになるため、接続を1本に制限する。
    pub fn create_pool_options(
        &self,
        timeout_secs: Option<u64>,
        in_memory: bool,
    ) -> PoolOptions<Any> {
        let timeout = timeout_secs.unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS);
        let max_connections = if in_memory { 1 } else { MAX_CONNECTIONS };

        let options = PoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(timeout));

        if in_memory {
            // 接続が閉じるとデータベースごと消えるため、アイドル切断を無効化する
            options.idle_timeout(None).max_lifetime(None)
        } else {
            options
        }
    }

    /// 接続プールを閉じる
    pub async fn close_pool(&self, pool: AnyPool) {
        pool.close().await;
    }
}
