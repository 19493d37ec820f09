// Credstoreライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: ドメイン型（設定、マイグレーション、アカウント、パスキー、エラー）
// - adapters: データベース接続、履歴テーブル、ドライバエラーの分類
// - services: マイグレーションの読み込み・適用、クエリカタログ、リポジトリ

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;
