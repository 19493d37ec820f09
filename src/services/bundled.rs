// 同梱ファイル
//
// バイナリに埋め込んだマイグレーションと名前付きクエリ。
// `init` コマンドはこれをプロジェクトへ書き出す。

use crate::core::config::Dialect;

/// 埋め込まれたファイル（方言ディレクトリからの相対パスと本文）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundledFile {
    pub path: &'static str,
    pub contents: &'static str,
}

macro_rules! bundled {
    ($root:literal, [$($path:literal),* $(,)?]) => {
        &[$(BundledFile {
            path: $path,
            contents: include_str!(concat!("../../", $root, "/", $path)),
        }),*]
    };
}

const POSTGRESQL_MIGRATIONS: &[BundledFile] = bundled!(
    "migrations/postgresql",
    [
        "20250101120000_create_accounts.sql",
        "20250101120100_create_passkey_users.sql",
        "20250101120200_create_passkey_user_credentials.sql",
    ]
);

const SQLITE_MIGRATIONS: &[BundledFile] = bundled!(
    "migrations/sqlite",
    [
        "20250101120000_create_accounts.sql",
        "20250101120100_create_passkey_users.sql",
        "20250101120200_create_passkey_user_credentials.sql",
    ]
);

const POSTGRESQL_QUERIES: &[BundledFile] = bundled!(
    "queries/postgresql",
    [
        "create-account.sql",
        "get-accounts.sql",
        "get-user-by-mail.sql",
        "passkey/create-user.sql",
        "passkey/create-user-credential.sql",
        "passkey/get-user-by-id.sql",
        "passkey/get-user-by-mail.sql",
        "passkey/get-user-credential-ids.sql",
        "passkey/get-user-credentials.sql",
    ]
);

const SQLITE_QUERIES: &[BundledFile] = bundled!(
    "queries/sqlite",
    [
        "create-account.sql",
        "get-accounts.sql",
        "get-user-by-mail.sql",
        "passkey/create-user.sql",
        "passkey/create-user-credential.sql",
        "passkey/get-user-by-id.sql",
        "passkey/get-user-by-mail.sql",
        "passkey/get-user-credential-ids.sql",
        "passkey/get-user-credentials.sql",
    ]
);

/// 方言に対応する同梱マイグレーション（MySQLは同梱なし）
pub fn bundled_migrations(dialect: Dialect) -> Option<&'static [BundledFile]> {
    match dialect {
        Dialect::PostgreSQL => Some(POSTGRESQL_MIGRATIONS),
        Dialect::SQLite => Some(SQLITE_MIGRATIONS),
        Dialect::MySQL => None,
    }
}

/// 方言に対応する同梱クエリ（MySQLは同梱なし）
pub fn bundled_queries(dialect: Dialect) -> Option<&'static [BundledFile]> {
    match dialect {
        Dialect::PostgreSQL => Some(POSTGRESQL_QUERIES),
        Dialect::SQLite => Some(SQLITE_QUERIES),
        Dialect::MySQL => None,
    }
}
