// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "credstore";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".credstore.yaml";

/// 既定のマイグレーションディレクトリ名
pub const MIGRATIONS_DIR: &str = "migrations";

/// 既定のクエリディレクトリ名
pub const QUERIES_DIR: &str = "queries";

/// マイグレーション履歴テーブル名
pub const HISTORY_TABLE: &str = "schema_migrations";
