// 接続文字列ビルダー
//
// DatabaseConfig と Dialect から sqlx の Any ドライバ向け接続URLを生成する。
// ユーザー名とパスワードは url クレートでパーセントエンコードする。

use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::DatabaseError;
use url::Url;

/// 接続文字列を生成
///
/// SQLiteはファイルが無ければ作成するモード（`mode=rwc`）で開く。
/// `:memory:` はそのまま渡す。
pub fn build_connection_string(
    dialect: Dialect,
    config: &DatabaseConfig,
) -> Result<String, DatabaseError> {
    match dialect {
        Dialect::PostgreSQL => server_url("postgresql", "postgres", dialect, config),
        Dialect::MySQL => server_url("mysql", "root", dialect, config),
        Dialect::SQLite => {
            if config.database == ":memory:" {
                Ok("sqlite::memory:".to_string())
            } else {
                Ok(format!("sqlite://{}?mode=rwc", config.database))
            }
        }
    }
}

fn invalid_settings(cause: impl ToString) -> DatabaseError {
    DatabaseError::Connection {
        message: "Invalid connection settings".to_string(),
        cause: cause.to_string(),
    }
}

fn server_url(
    scheme: &str,
    default_user: &str,
    dialect: Dialect,
    config: &DatabaseConfig,
) -> Result<String, DatabaseError> {
    let host = match config.effective_port(dialect) {
        Some(port) => format!("{}:{}", config.host, port),
        None => config.host.clone(),
    };
    let mut url = Url::parse(&format!("{}://{}", scheme, host)).map_err(invalid_settings)?;
    url.set_path(&format!("/{}", config.database));

    let user = config.user.as_deref().unwrap_or(default_user);
    url.set_username(user)
        .map_err(|_| invalid_settings(format!("cannot set user name '{}'", user)))?;
    if let Some(password) = config.password.as_deref().filter(|p| !p.is_empty()) {
        url.set_password(Some(password))
            .map_err(|_| invalid_settings("cannot set password"))?;
    }

    Ok(url.to_string())
}
