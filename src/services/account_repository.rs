// アカウントリポジトリ
//
// クエリカタログの accounts 向けクエリを実行する。

use crate::core::account::{Account, NewAccount};
use crate::core::error::RepositoryError;
use crate::services::query_catalog::QueryCatalog;
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use tracing::debug;

pub const GET_USER_BY_MAIL: &str = "get-user-by-mail";
pub const CREATE_ACCOUNT: &str = "create-account";
pub const GET_ACCOUNTS: &str = "get-accounts";

/// アカウントリポジトリ
#[derive(Debug, Clone, Copy)]
pub struct AccountRepository<'a> {
    pool: &'a AnyPool,
    catalog: &'a QueryCatalog,
}

impl<'a> AccountRepository<'a> {
    pub fn new(pool: &'a AnyPool, catalog: &'a QueryCatalog) -> Self {
        Self { pool, catalog }
    }

    /// メールアドレスでアカウントを検索
    ///
    /// 該当が無い場合は `Ok(None)`。
    pub async fn get_by_mail(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        let query = self.catalog.prepare(GET_USER_BY_MAIL, 1)?;

        let row = sqlx::query(&query.sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        debug!(found = row.is_some(), "Looked up account by mail");
        row.as_ref().map(account_from_row).transpose()
    }

    /// アカウントを作成し、採番されたidを返す
    ///
    /// メールアドレスが既に使われている場合は `RepositoryError::Conflict`。
    pub async fn create(&self, account: &NewAccount) -> Result<i64, RepositoryError> {
        let values = account.bind_values();
        let query = self.catalog.prepare(CREATE_ACCOUNT, values.len())?;

        let mut statement = sqlx::query(&query.sql);
        for value in values {
            statement = statement.bind(value);
        }
        let row = statement.fetch_one(self.pool).await?;

        Ok(row.try_get::<i64, _>("id")?)
    }

    /// id順のページ単位でアカウントを取得（pageは0始まり）
    pub async fn list(&self, page: u32, page_size: u32) -> Result<Vec<Account>, RepositoryError> {
        let query = self.catalog.prepare(GET_ACCOUNTS, 2)?;
        let limit = i64::from(page_size);
        let offset = i64::from(page) * limit;

        let rows = sqlx::query(&query.sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        rows.iter().map(account_from_row).collect()
    }
}

fn account_from_row(row: &AnyRow) -> Result<Account, RepositoryError> {
    Ok(Account {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_plain: row.try_get("password_plain")?,
        password_hashed: row.try_get("password_hashed")?,
        password_salted: row.try_get("password_salted")?,
        password_peppered: row.try_get("password_peppered")?,
        password_salted_and_peppered: row.try_get("password_salted_and_peppered")?,
    })
}
