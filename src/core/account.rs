// アカウントドメインモデル
//
// accountsテーブルの行に対応する型。
// パスワードの5種類の表現はスキーマの定義どおりにそのまま保持し、
// このクレートでは生成・検証を行いません。

use serde::{Deserialize, Serialize};

/// アカウント（accountsテーブルの1行）
///
/// `get-user-by-mail` の結果形状そのものです。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_plain: String,
    pub password_hashed: String,
    pub password_salted: String,
    pub password_peppered: String,
    pub password_salted_and_peppered: String,
}

/// 新規アカウント
///
/// idはデータベースが採番します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_plain: String,
    pub password_hashed: String,
    pub password_salted: String,
    pub password_peppered: String,
    pub password_salted_and_peppered: String,
}

impl NewAccount {
    /// 採番されたidと組み合わせてAccountにする
    pub fn into_account(self, id: i64) -> Account {
        Account {
            id,
            name: self.name,
            email: self.email,
            password_plain: self.password_plain,
            password_hashed: self.password_hashed,
            password_salted: self.password_salted,
            password_peppered: self.password_peppered,
            password_salted_and_peppered: self.password_salted_and_peppered,
        }
    }

    /// バインド順（create-account の $1..$7）に並べた値
    pub fn bind_values(&self) -> [&str; 7] {
        [
            &self.name,
            &self.email,
            &self.password_plain,
            &self.password_hashed,
            &self.password_salted,
            &self.password_peppered,
            &self.password_salted_and_peppered,
        ]
    }
}
