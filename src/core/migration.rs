// マイグレーションドメインモデル
//
// マイグレーションファイルの定義と適用履歴を表現する型システム。
// MigrationFile, Migration, MigrationRecord, AppliedMigration,
// MigrationStatus, MigrationHistory などの構造体を提供します。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// マイグレーションファイル
///
/// `<timestamp>_<description>.sql` 形式のファイル1つに対応します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationFile {
    /// マイグレーションバージョン（タイムスタンプ: YYYYMMDDHHmmss）
    pub version: String,

    /// マイグレーションの説明
    pub description: String,

    /// マイグレーションSQL（1つ以上のDDL文）
    pub sql: String,

    /// SQL本文のチェックサム（SHA-256）
    pub checksum: String,

    /// 読み込み元のファイルパス（同梱マイグレーションの場合はNone）
    pub file_path: Option<PathBuf>,
}

impl MigrationFile {
    /// 新しいマイグレーションファイルを作成
    pub fn new(
        version: String,
        description: String,
        sql: String,
        checksum: String,
        file_path: Option<PathBuf>,
    ) -> Self {
        Self {
            version,
            description,
            sql,
            checksum,
            file_path,
        }
    }

    /// マイグレーション名（ファイル名から拡張子を除いたもの）
    pub fn name(&self) -> String {
        format!("{}_{}", self.version, self.description)
    }

    /// バージョン形式が有効かどうかを検証
    pub fn validate_version(&self) -> bool {
        is_valid_version(&self.version)
    }

    /// 履歴記録用のMigrationに変換
    pub fn to_migration(&self) -> Migration {
        Migration::new(
            self.version.clone(),
            self.description.clone(),
            self.checksum.clone(),
        )
    }
}

/// YYYYMMDDHHmmss形式（14桁の数字）かどうか
pub fn is_valid_version(version: &str) -> bool {
    version.len() == 14 && version.chars().all(|c| c.is_ascii_digit())
}

/// マイグレーション
///
/// 履歴テーブルへ記録する情報。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    /// マイグレーションバージョン
    pub version: String,

    /// マイグレーションの説明
    pub description: String,

    /// マイグレーションファイルのチェックサム
    pub checksum: String,

    /// 記録日時
    pub timestamp: DateTime<Utc>,
}

impl Migration {
    /// 新しいマイグレーションを作成
    pub fn new(version: String, description: String, checksum: String) -> Self {
        Self {
            version,
            description,
            checksum,
            timestamp: Utc::now(),
        }
    }
}

/// マイグレーション記録
///
/// schema_migrationsテーブルに保存されるレコードに対応します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// マイグレーションバージョン
    pub version: String,

    /// マイグレーションの説明
    pub description: String,

    /// マイグレーションが適用された日時
    pub applied_at: DateTime<Utc>,

    /// マイグレーションファイルのチェックサム
    pub checksum: String,
}

impl MigrationRecord {
    /// 新しいマイグレーション記録を作成
    pub fn new(version: String, description: String, checksum: String) -> Self {
        Self {
            version,
            description,
            applied_at: Utc::now(),
            checksum,
        }
    }

    /// チェックサムが一致するか確認
    pub fn verify_checksum(&self, expected_checksum: &str) -> bool {
        self.checksum == expected_checksum
    }
}

/// 適用済みマイグレーション
///
/// 今回の実行で適用されたマイグレーションと所要時間。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub version: String,
    pub description: String,
    pub applied_at: DateTime<Utc>,
    /// 適用にかかった時間（ミリ秒）
    pub duration_ms: i64,
}

impl AppliedMigration {
    /// 新しい適用済みマイグレーションを作成
    pub fn new(
        version: String,
        description: String,
        applied_at: DateTime<Utc>,
        duration_ms: i64,
    ) -> Self {
        Self {
            version,
            description,
            applied_at,
            duration_ms,
        }
    }
}

/// マイグレーションステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    /// 適用済み
    Applied,
    /// 未適用
    Pending,
    /// DBに記録があるがローカルファイルが存在しない
    Orphaned,
    /// 適用済みだがファイルが変更されている
    AppliedChecksumMismatch,
}

impl MigrationStatus {
    /// 表示用のラベル
    pub fn label(&self) -> &'static str {
        match self {
            MigrationStatus::Applied => "Applied",
            MigrationStatus::Pending => "Pending",
            MigrationStatus::Orphaned => "Orphaned",
            MigrationStatus::AppliedChecksumMismatch => "Applied (checksum mismatch)",
        }
    }

    /// 適用済み状態かどうか（チェックサム不一致を含む）
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            MigrationStatus::Applied | MigrationStatus::AppliedChecksumMismatch
        )
    }
}

/// マイグレーションステータスエントリ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationStatusEntry {
    pub version: String,
    pub description: String,
    pub status: MigrationStatus,
}

/// マイグレーション履歴
///
/// データベースに適用されたマイグレーションの履歴を表現します。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationHistory {
    /// マイグレーション記録のリスト（バージョン昇順）
    pub records: Vec<MigrationRecord>,
}

impl MigrationHistory {
    /// 記録のリストから履歴を作成
    pub fn new(mut records: Vec<MigrationRecord>) -> Self {
        records.sort_by(|a, b| a.version.cmp(&b.version));
        Self { records }
    }

    /// 最新のマイグレーションバージョンを取得
    pub fn latest_version(&self) -> Option<&str> {
        self.records.last().map(|r| r.version.as_str())
    }

    /// 指定されたバージョンの記録を取得
    pub fn get_record(&self, version: &str) -> Option<&MigrationRecord> {
        self.records.iter().find(|r| r.version == version)
    }

    /// 指定されたバージョンが適用済みか確認
    pub fn is_applied(&self, version: &str) -> bool {
        self.get_record(version).is_some()
    }

    /// マイグレーション記録の数を取得
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// ローカルファイルと照合して各マイグレーションの状態を求める
    ///
    /// 結果はバージョン昇順。DBにのみ存在する記録は Orphaned になります。
    pub fn status_of(&self, local: &[MigrationFile]) -> Vec<MigrationStatusEntry> {
        let applied: HashMap<&str, &MigrationRecord> = self
            .records
            .iter()
            .map(|r| (r.version.as_str(), r))
            .collect();
        let local_versions: HashSet<&str> = local.iter().map(|m| m.version.as_str()).collect();

        let mut entries: Vec<MigrationStatusEntry> = local
            .iter()
            .map(|file| {
                let status = match applied.get(file.version.as_str()) {
                    Some(record) if record.verify_checksum(&file.checksum) => {
                        MigrationStatus::Applied
                    }
                    Some(_) => MigrationStatus::AppliedChecksumMismatch,
                    None => MigrationStatus::Pending,
                };
                MigrationStatusEntry {
                    version: file.version.clone(),
                    description: file.description.clone(),
                    status,
                }
            })
            .collect();

        for record in &self.records {
            if !local_versions.contains(record.version.as_str()) {
                entries.push(MigrationStatusEntry {
                    version: record.version.clone(),
                    description: record.description.clone(),
                    status: MigrationStatus::Orphaned,
                });
            }
        }

        entries.sort_by(|a, b| a.version.cmp(&b.version));
        entries
    }
}
