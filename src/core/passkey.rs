// パスキーのドメインモデル
//
// passkey_users と passkey_user_credentials の行、
// および credential 列に保存される文書の型を定義します。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// パスキーユーザー（passkey_usersテーブルの1行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasskeyUser {
    pub id: Uuid,
    pub mail: String,
    pub name: String,
}

impl PasskeyUser {
    /// ランダムなidで新しいユーザーを作成
    pub fn new(mail: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mail: mail.into(),
            name: name.into(),
        }
    }
}

/// パスキー資格情報（passkey_user_credentialsテーブルの1行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasskeyUserCredential {
    pub credential_id: Vec<u8>,
    pub user_id: Uuid,
    pub credential: CredentialPayload,
}

/// WebAuthnパスキーとして解釈できる資格情報文書
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasskeyCredentialData {
    pub credential_id: Vec<u8>,
    pub public_key: Vec<u8>,
    #[serde(default)]
    pub counter: u32,
    #[serde(default)]
    pub transports: Vec<String>,
    #[serde(default)]
    pub backup_eligible: bool,
    #[serde(default)]
    pub backup_state: bool,
}

/// credential列の文書
///
/// `format` フィールドで種類を判別します。`"passkey"` として解釈できない文書は
/// 元の文書を保持したまま `Opaque` になり、読み出しで行が失われることはありません。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum CredentialPayload {
    Passkey(PasskeyCredentialData),
    Opaque { format: String, document: Value },
}

impl CredentialPayload {
    pub const FORMAT_KEY: &'static str = "format";
    pub const PASSKEY_FORMAT: &'static str = "passkey";
    pub const UNKNOWN_FORMAT: &'static str = "unknown";

    /// 文書の形式名
    pub fn format(&self) -> &str {
        match self {
            CredentialPayload::Passkey(_) => Self::PASSKEY_FORMAT,
            CredentialPayload::Opaque { format, .. } => format,
        }
    }

    /// パスキーとして解釈できた場合はその内容
    pub fn as_passkey(&self) -> Option<&PasskeyCredentialData> {
        match self {
            CredentialPayload::Passkey(data) => Some(data),
            CredentialPayload::Opaque { .. } => None,
        }
    }

    /// JSON文字列から復元
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Value>(json).map(Self::from)
    }

    /// 保存用のJSON文字列
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<Value> for CredentialPayload {
    fn from(document: Value) -> Self {
        let format = document
            .get(Self::FORMAT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);

        if format.as_deref() == Some(Self::PASSKEY_FORMAT) {
            if let Ok(data) = serde_json::from_value::<PasskeyCredentialData>(document.clone()) {
                return CredentialPayload::Passkey(data);
            }
        }

        CredentialPayload::Opaque {
            format: format.unwrap_or_else(|| Self::UNKNOWN_FORMAT.to_string()),
            document,
        }
    }
}

impl From<CredentialPayload> for Value {
    fn from(payload: CredentialPayload) -> Self {
        match payload {
            CredentialPayload::Passkey(data) => {
                let mut object = match serde_json::to_value(data) {
                    Ok(Value::Object(object)) => object,
                    _ => Map::new(),
                };
                object.insert(
                    CredentialPayload::FORMAT_KEY.to_string(),
                    Value::String(CredentialPayload::PASSKEY_FORMAT.to_string()),
                );
                Value::Object(object)
            }
            CredentialPayload::Opaque { document, .. } => document,
        }
    }
}
