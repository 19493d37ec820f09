// Services Layer
// マイグレーションの読み込み・適用と名前付きクエリの実行

pub mod account_repository;
pub mod bundled;
pub mod config_loader;
pub mod migration_loader;
pub mod passkey_repository;
pub mod query_catalog;
pub mod reference_checker;
pub mod schema_store;
pub mod sql_splitter;
