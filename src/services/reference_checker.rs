// テーブル参照チェッカー
//
// マイグレーションのDDLから作成されるテーブルと REFERENCES 先のテーブルを抽出し、
// 適用前に参照先が用意されているかを確認する。

use crate::core::error::MigrationError;
use crate::core::migration::MigrationFile;
use crate::services::sql_splitter::mask_comments_and_literals;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

const TABLE_NAME: &str = r#"((?:"?[A-Za-z_][A-Za-z0-9_]*"?\.)?"?[A-Za-z_][A-Za-z0-9_]*"?)"#;

static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bCREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?{}",
        TABLE_NAME
    ))
    .expect("create table pattern is valid")
});

static REFERENCES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\bREFERENCES\s+{}", TABLE_NAME))
        .expect("references pattern is valid")
});

/// テーブル名を比較用に正規化（スキーマ修飾と引用符を除去し小文字化）
fn normalize(name: &str) -> String {
    let unqualified = name.rsplit('.').next().unwrap_or(name);
    unqualified.trim_matches('"').to_ascii_lowercase()
}

fn capture_tables(re: &Regex, sql: &str) -> BTreeSet<String> {
    let sql = mask_comments_and_literals(sql);
    re.captures_iter(&sql)
        .filter_map(|caps| caps.get(1))
        .map(|m| normalize(m.as_str()))
        .collect()
}

/// SQLの中で作成されるテーブル
pub fn created_tables(sql: &str) -> BTreeSet<String> {
    capture_tables(&CREATE_TABLE, sql)
}

/// SQLの中で REFERENCES により参照されるテーブル
pub fn referenced_tables(sql: &str) -> BTreeSet<String> {
    capture_tables(&REFERENCES, sql)
}

/// 参照先テーブルが揃っているかを確認
///
/// `applied` は既に適用済みのマイグレーション、`pending` はこれから適用するもの
/// （いずれもバージョン昇順）。参照先は同じか前のマイグレーションで作成されるか、
/// `existing` に含まれている必要があります。
pub fn verify_references(
    applied: &[&MigrationFile],
    pending: &[&MigrationFile],
    existing: &BTreeSet<String>,
) -> Result<(), MigrationError> {
    let mut available: BTreeSet<String> = existing.iter().map(|t| normalize(t)).collect();
    for migration in applied {
        available.extend(created_tables(&migration.sql));
    }

    for migration in pending {
        available.extend(created_tables(&migration.sql));

        if let Some(missing) = referenced_tables(&migration.sql)
            .into_iter()
            .find(|table| !available.contains(table))
        {
            return Err(MigrationError::new(
                migration.version.clone(),
                migration.description.clone(),
                format!(
                    "referenced table '{}' is not created by this or any earlier migration",
                    missing
                ),
            ));
        }
    }

    Ok(())
}
