// マイグレーションファイル読み込み
//
// `<timestamp>_<description>.sql` 形式のファイルを読み込み、
// バージョン順に並んだ MigrationFile のリストを作成する。

use crate::core::error::{IoError, SchemaStoreError};
use crate::core::migration::{is_valid_version, MigrationFile};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SQL_EXTENSION: &str = "sql";

/// SQL本文のチェックサム（SHA-256の16進表記）を計算
pub fn calculate_checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// ファイル名から (version, description) を取り出す
///
/// 形式が不正な場合は理由を返す。
pub fn parse_file_name(file_name: &str) -> Result<(String, String), String> {
    let stem = file_name
        .strip_suffix(".sql")
        .ok_or_else(|| "missing .sql extension".to_string())?;

    let (version, description) = stem.split_once('_').ok_or_else(|| {
        "does not match expected format '{timestamp}_{description}.sql'".to_string()
    })?;

    if !is_valid_version(version) {
        return Err(format!(
            "version '{}' is not a valid 14-digit timestamp (YYYYMMDDHHmmss)",
            version
        ));
    }
    if description.is_empty() {
        return Err("description is empty".to_string());
    }

    Ok((version.to_string(), description.to_string()))
}

/// ディレクトリからマイグレーションを読み込む
///
/// - `.` で始まるファイルと `.sql` 以外のファイルはスキップ
/// - 名前が不正なファイルは警告を出力してスキップ
/// - 重複バージョンはエラー
pub fn load_from_dir(dir: &Path) -> Result<Vec<MigrationFile>, SchemaStoreError> {
    let entries = fs::read_dir(dir).map_err(|e| IoError::DirectoryRead {
        path: dir.display().to_string(),
        cause: e.to_string(),
    })?;

    let mut sources: Vec<(String, String, Option<PathBuf>)> = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| IoError::DirectoryRead {
            path: dir.display().to_string(),
            cause: e.to_string(),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('.')
            || path.extension().and_then(|e| e.to_str()) != Some(SQL_EXTENSION)
        {
            continue;
        }

        let sql = fs::read_to_string(&path).map_err(|e| IoError::FileRead {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;

        sources.push((file_name.to_string(), sql, Some(path.clone())));
    }

    debug!(dir = %dir.display(), files = sources.len(), "Scanned migrations directory");
    from_sources(sources)
}

/// (ファイル名, SQL本文, パス) の組からマイグレーションのリストを作成
pub fn from_sources<I>(sources: I) -> Result<Vec<MigrationFile>, SchemaStoreError>
where
    I: IntoIterator<Item = (String, String, Option<PathBuf>)>,
{
    let mut migrations = Vec::new();

    for (file_name, sql, path) in sources {
        match parse_file_name(&file_name) {
            Ok((version, description)) => {
                let checksum = calculate_checksum(&sql);
                migrations.push(MigrationFile::new(version, description, sql, checksum, path));
            }
            Err(reason) => {
                warn!(file = %file_name, reason = %reason, "Skipping migration file");
            }
        }
    }

    migrations.sort_by(|a, b| a.version.cmp(&b.version));

    if let Some(window) = migrations
        .windows(2)
        .find(|window| window[0].version == window[1].version)
    {
        return Err(SchemaStoreError::DuplicateVersion {
            version: window[0].version.clone(),
            first: window[0].name(),
            second: window[1].name(),
        });
    }

    Ok(migrations)
}
