// パスキーリポジトリ
//
// passkey_users と passkey_user_credentials に対する名前付きクエリを実行する。
// UUIDは文字列として、credential文書はJSON文字列としてバインドする。

use crate::core::error::RepositoryError;
use crate::core::passkey::{CredentialPayload, PasskeyUser, PasskeyUserCredential};
use crate::services::query_catalog::QueryCatalog;
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use uuid::Uuid;

pub const CREATE_USER: &str = "passkey/create-user";
pub const GET_USER_BY_MAIL: &str = "passkey/get-user-by-mail";
pub const GET_USER_BY_ID: &str = "passkey/get-user-by-id";
pub const CREATE_USER_CREDENTIAL: &str = "passkey/create-user-credential";
pub const GET_USER_CREDENTIAL_IDS: &str = "passkey/get-user-credential-ids";
pub const GET_USER_CREDENTIALS: &str = "passkey/get-user-credentials";

#[derive(Debug, Clone, Copy)]
pub struct PasskeyRepository<'a> {
    pool: &'a AnyPool,
    catalog: &'a QueryCatalog,
}

impl<'a> PasskeyRepository<'a> {
    pub fn new(pool: &'a AnyPool, catalog: &'a QueryCatalog) -> Self {
        Self { pool, catalog }
    }

    /// パスキーユーザーを登録
    pub async fn create_user(&self, user: &PasskeyUser) -> Result<(), RepositoryError> {
        let query = self.catalog.prepare(CREATE_USER, 3)?;

        sqlx::query(&query.sql)
            .bind(user.id.to_string())
            .bind(user.mail.as_str())
            .bind(user.name.as_str())
            .execute(self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_user_by_mail(
        &self,
        mail: &str,
    ) -> Result<Option<PasskeyUser>, RepositoryError> {
        let query = self.catalog.prepare(GET_USER_BY_MAIL, 1)?;

        let row = sqlx::query(&query.sql)
            .bind(mail)
            .fetch_optional(self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<PasskeyUser>, RepositoryError> {
        let query = self.catalog.prepare(GET_USER_BY_ID, 1)?;

        let row = sqlx::query(&query.sql)
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// 資格情報を登録
    ///
    /// credential_id の重複は `Conflict`、存在しないユーザーへの登録は `ForeignKey`。
    pub async fn create_credential(
        &self,
        credential: &PasskeyUserCredential,
    ) -> Result<(), RepositoryError> {
        let query = self.catalog.prepare(CREATE_USER_CREDENTIAL, 3)?;
        let document = credential.credential.to_json()?;

        sqlx::query(&query.sql)
            .bind(credential.credential_id.clone())
            .bind(credential.user_id.to_string())
            .bind(document)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// ユーザーの資格情報IDの一覧
    pub async fn get_credential_ids(&self, user_id: Uuid) -> Result<Vec<Vec<u8>>, RepositoryError> {
        let query = self.catalog.prepare(GET_USER_CREDENTIAL_IDS, 1)?;

        let rows = sqlx::query(&query.sql)
            .bind(user_id.to_string())
            .fetch_all(self.pool)
            .await?;

        rows.iter()
            .map(|row| Ok(row.try_get::<Vec<u8>, _>("credential_id")?))
            .collect()
    }

    /// ユーザーの資格情報の一覧
    pub async fn get_credentials(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PasskeyUserCredential>, RepositoryError> {
        let query = self.catalog.prepare(GET_USER_CREDENTIALS, 1)?;

        let rows = sqlx::query(&query.sql)
            .bind(user_id.to_string())
            .fetch_all(self.pool)
            .await?;

        rows.iter().map(credential_from_row).collect()
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(value).map_err(|e| RepositoryError::Decode {
        message: format!("invalid uuid '{}': {}", value, e),
    })
}

fn user_from_row(row: &AnyRow) -> Result<PasskeyUser, RepositoryError> {
    let id: String = row.try_get("id")?;
    Ok(PasskeyUser {
        id: parse_uuid(&id)?,
        mail: row.try_get("mail")?,
        name: row.try_get("name")?,
    })
}

fn credential_from_row(row: &AnyRow) -> Result<PasskeyUserCredential, RepositoryError> {
    let user_id: String = row.try_get("user_id")?;
    let document: String = row.try_get("credential")?;
    Ok(PasskeyUserCredential {
        credential_id: row.try_get("credential_id")?,
        user_id: parse_uuid(&user_id)?,
        credential: CredentialPayload::from_json(&document)?,
    })
}
