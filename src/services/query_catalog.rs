// クエリカタログ
//
// 名前付きのパラメータ化SQLを読み込み、名前で引けるようにする。
// ファイル名（拡張子なし）がクエリ名になり、サブディレクトリは `/` で名前空間を作る。

use crate::core::config::Dialect;
use crate::core::error::{CatalogError, IoError};
use crate::services::bundled::bundled_queries;
use crate::services::sql_splitter::{mask_comments_and_literals, tokenize, TokenKind};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("placeholder pattern is valid"));

/// 名前付きクエリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedQuery {
    /// クエリ名（例: `get-user-by-mail`, `passkey/get-user-by-mail`）
    pub name: String,
    /// SQL本文（末尾の `;` は除去済み）
    pub sql: String,
    /// 位置パラメータの数（最大の `$n`）
    pub parameter_count: usize,
}

impl NamedQuery {
    /// SQL本文から名前付きクエリを作成
    pub fn new(name: impl Into<String>, sql: &str) -> Result<Self, CatalogError> {
        let name = name.into();
        let sql = sql.trim().trim_end_matches(';').trim_end().to_string();

        let has_code = tokenize(&sql)
            .iter()
            .any(|(kind, text)| *kind != TokenKind::Comment && !text.trim().is_empty());
        if !has_code {
            return Err(CatalogError::EmptyQuery { name });
        }

        let parameter_count = count_parameters(&sql);
        Ok(Self {
            name,
            sql,
            parameter_count,
        })
    }

    /// 宣言されたパラメータ数
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// バインドする引数の数を検証
    pub fn check_arity(&self, actual: usize) -> Result<(), CatalogError> {
        if actual != self.parameter_count {
            return Err(CatalogError::ArityMismatch {
                name: self.name.clone(),
                expected: self.parameter_count,
                actual,
            });
        }
        Ok(())
    }
}

/// SQL中の最大の `$n` を数える（コメントと文字列リテラル内は無視）
pub fn count_parameters(sql: &str) -> usize {
    let sql = mask_comments_and_literals(sql);
    PLACEHOLDER
        .captures_iter(&sql)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<usize>().ok())
        .max()
        .unwrap_or(0)
}

/// クエリカタログ
#[derive(Debug, Clone, Default)]
pub struct QueryCatalog {
    queries: BTreeMap<String, NamedQuery>,
}

impl QueryCatalog {
    /// 空のカタログを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ディレクトリ配下の `*.sql` を再帰的に読み込む
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.load_recursive(dir, "")?;
        debug!(dir = %dir.display(), queries = catalog.len(), "Loaded query catalog");
        Ok(catalog)
    }

    /// 同梱クエリから作成
    pub fn bundled(dialect: Dialect) -> Result<Self, CatalogError> {
        let files = bundled_queries(dialect).ok_or_else(|| CatalogError::Io(IoError::FileNotFound {
            path: format!("bundled queries for {}", dialect),
        }))?;

        let mut catalog = Self::new();
        for file in files {
            let name = file.path.strip_suffix(".sql").unwrap_or(file.path);
            catalog.insert(NamedQuery::new(name, file.contents)?);
        }
        Ok(catalog)
    }

    fn load_recursive(&mut self, dir: &Path, prefix: &str) -> Result<(), CatalogError> {
        let entries = fs::read_dir(dir).map_err(|e| IoError::DirectoryRead {
            path: dir.display().to_string(),
            cause: e.to_string(),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| IoError::DirectoryRead {
                path: dir.display().to_string(),
                cause: e.to_string(),
            })?;
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }

            if path.is_dir() {
                let nested = format!("{}{}/", prefix, file_name);
                self.load_recursive(&path, &nested)?;
                continue;
            }

            let Some(stem) = file_name.strip_suffix(".sql") else {
                continue;
            };
            let sql = fs::read_to_string(&path).map_err(|e| IoError::FileRead {
                path: path.display().to_string(),
                cause: e.to_string(),
            })?;
            self.insert(NamedQuery::new(format!("{}{}", prefix, stem), &sql)?);
        }

        Ok(())
    }

    /// クエリを追加（同名のものは置き換える）
    pub fn insert(&mut self, query: NamedQuery) {
        self.queries.insert(query.name.clone(), query);
    }

    /// 名前でクエリを取得
    pub fn get(&self, name: &str) -> Result<&NamedQuery, CatalogError> {
        self.queries
            .get(name)
            .ok_or_else(|| CatalogError::UnknownQuery {
                name: name.to_string(),
            })
    }

    /// 名前で取得し、引数の数を検証する
    pub fn prepare(&self, name: &str, arity: usize) -> Result<&NamedQuery, CatalogError> {
        let query = self.get(name)?;
        query.check_arity(arity)?;
        Ok(query)
    }

    /// クエリ名の一覧（辞書順）
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    /// クエリの一覧（名前の辞書順）
    pub fn queries(&self) -> impl Iterator<Item = &NamedQuery> {
        self.queries.values()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
