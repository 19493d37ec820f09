// Core Domain
// マイグレーション、設定、アカウント/パスキーのドメイン型とエラー定義

pub mod account;
pub mod config;
pub mod error;
pub mod migration;
pub mod naming;
pub mod passkey;
