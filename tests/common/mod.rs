// 統合テスト共通ヘルパー

#![allow(dead_code)]

use credstore::adapters::database::DatabaseConnectionService;
use credstore::core::account::NewAccount;
use credstore::core::config::Dialect;
use credstore::services::query_catalog::QueryCatalog;
use credstore::services::schema_store::SchemaStore;
use sqlx::AnyPool;
use tempfile::TempDir;

/// 一時ディレクトリ上のSQLiteファイルに接続する
pub async fn sqlite_pool() -> (TempDir, AnyPool) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("credstore.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = DatabaseConnectionService::new()
        .connect_url(&url, Some(5))
        .await
        .unwrap();

    (temp_dir, pool)
}

/// 同梱マイグレーションを適用済みのSQLiteと同梱カタログを用意する
pub async fn migrated_sqlite() -> (TempDir, AnyPool, QueryCatalog) {
    let (temp_dir, pool) = sqlite_pool().await;
    SchemaStore::bundled(Dialect::SQLite)
        .unwrap()
        .apply(&pool)
        .await
        .unwrap();
    let catalog = QueryCatalog::bundled(Dialect::SQLite).unwrap();
    (temp_dir, pool, catalog)
}

/// すべてのパスワード表現が同じ値のアカウント
pub fn new_account(name: &str, email: &str, password: &str) -> NewAccount {
    NewAccount {
        name: name.to_string(),
        email: email.to_string(),
        password_plain: password.to_string(),
        password_hashed: password.to_string(),
        password_salted: password.to_string(),
        password_peppered: password.to_string(),
        password_salted_and_peppered: password.to_string(),
    }
}
