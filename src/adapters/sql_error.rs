// SQLxエラーの分類
//
// ドライバのエラーを制約違反の種類ごとに RepositoryError へ振り分ける。

use crate::core::error::RepositoryError;
use sqlx::error::ErrorKind;

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        let kind = match &error {
            sqlx::Error::Database(db_error) => Some((
                db_error.kind(),
                db_error.message().to_string(),
                db_error.constraint().map(str::to_string),
            )),
            _ => None,
        };

        match kind {
            Some((ErrorKind::UniqueViolation, message, constraint)) => {
                RepositoryError::Conflict { message, constraint }
            }
            Some((ErrorKind::ForeignKeyViolation, message, constraint)) => {
                RepositoryError::ForeignKey { message, constraint }
            }
            _ => RepositoryError::Database(error),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(error: serde_json::Error) -> Self {
        RepositoryError::Decode {
            message: error.to_string(),
        }
    }
}
