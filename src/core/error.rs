// エラー型定義
//
// ライブラリ全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、MigrationError, DatabaseError, IoError, SchemaStoreError,
// CatalogError, RepositoryError を定義します。

use thiserror::Error;

/// マイグレーションエラー
///
/// マイグレーション適用時に発生するエラーを表現します。
/// 失敗したマイグレーションの名前（`<version>_<description>`）を必ず含みます。
#[derive(Debug, Clone, Error)]
#[error("Migration {version}_{description} failed: {error}")]
pub struct MigrationError {
    /// マイグレーションバージョン
    pub version: String,
    /// マイグレーションの説明
    pub description: String,
    /// エラーメッセージ
    pub error: String,
    /// 失敗したSQL文
    pub sql_statement: Option<String>,
}

impl MigrationError {
    /// 新しいマイグレーションエラーを作成
    pub fn new(version: String, description: String, error: String) -> Self {
        Self {
            version,
            description,
            error,
            sql_statement: None,
        }
    }

    /// SQL文を指定してマイグレーションエラーを作成
    pub fn with_sql(
        version: String,
        description: String,
        error: String,
        sql_statement: String,
    ) -> Self {
        Self {
            version,
            description,
            error,
            sql_statement: Some(sql_statement),
        }
    }

    /// バージョンを取得
    pub fn version(&self) -> &str {
        &self.version
    }

    /// マイグレーション名（ファイル名のステム）を取得
    pub fn migration_name(&self) -> String {
        format!("{}_{}", self.version, self.description)
    }

    /// SQL文が含まれているかどうか
    pub fn has_sql_statement(&self) -> bool {
        self.sql_statement.is_some()
    }
}

/// データベースエラー
///
/// データベース操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Transaction error
    #[error("Transaction error: {message}")]
    Transaction {
        /// エラーメッセージ
        message: String,
    },
}

impl DatabaseError {
    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, DatabaseError::Query { .. })
    }

    /// トランザクションエラーかどうか
    pub fn is_transaction(&self) -> bool {
        matches!(self, DatabaseError::Transaction { .. })
    }
}

/// I/Oエラー
///
/// ファイル操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// ファイルパス
        path: String,
    },

    /// File read error
    #[error("Failed to read file: {path} (cause: {cause})")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Directory read error
    #[error("Failed to read directory: {path} (cause: {cause})")]
    DirectoryRead {
        /// ディレクトリパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl IoError {
    /// ファイルが見つからないエラーかどうか
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, IoError::FileNotFound { .. })
    }

    /// ファイル読み込みエラーかどうか
    pub fn is_file_read(&self) -> bool {
        matches!(self, IoError::FileRead { .. })
    }

    /// ディレクトリ読み込みエラーかどうか
    pub fn is_directory_read(&self) -> bool {
        matches!(self, IoError::DirectoryRead { .. })
    }
}

/// スキーマストアのエラー
///
/// マイグレーションの読み込み・適用・状態確認で発生するエラーを束ねます。
#[derive(Debug, Error)]
pub enum SchemaStoreError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// Duplicate migration version
    #[error("Duplicate migration version detected: '{version}' ({first} and {second})")]
    DuplicateVersion {
        /// 重複したバージョン
        version: String,
        /// 1つ目のマイグレーション名
        first: String,
        /// 2つ目のマイグレーション名
        second: String,
    },

    /// Bundled files are not available for the dialect
    #[error("No bundled migrations for dialect '{dialect}'")]
    UnsupportedDialect {
        /// 対象のデータベース方言
        dialect: String,
    },
}

impl SchemaStoreError {
    /// マイグレーション適用エラーかどうか
    pub fn is_migration(&self) -> bool {
        matches!(self, SchemaStoreError::Migration(_))
    }

    /// 失敗したマイグレーションのエラーを取得
    pub fn migration_error(&self) -> Option<&MigrationError> {
        match self {
            SchemaStoreError::Migration(error) => Some(error),
            _ => None,
        }
    }

    /// バージョン重複エラーかどうか
    pub fn is_duplicate_version(&self) -> bool {
        matches!(self, SchemaStoreError::DuplicateVersion { .. })
    }
}

/// クエリカタログのエラー
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Unknown query name
    #[error("Query '{name}' is not defined in the catalog")]
    UnknownQuery {
        /// クエリ名
        name: String,
    },

    /// Wrong number of bound arguments
    #[error("Query '{name}' expects {expected} parameter(s) but {actual} were bound")]
    ArityMismatch {
        /// クエリ名
        name: String,
        /// 宣言されたパラメータ数
        expected: usize,
        /// バインドされた引数の数
        actual: usize,
    },

    /// Query file contains no statement
    #[error("Query '{name}' is empty")]
    EmptyQuery {
        /// クエリ名
        name: String,
    },

    #[error(transparent)]
    Io(#[from] IoError),
}

impl CatalogError {
    /// 未定義クエリエラーかどうか
    pub fn is_unknown_query(&self) -> bool {
        matches!(self, CatalogError::UnknownQuery { .. })
    }

    /// 引数の数の不一致エラーかどうか
    pub fn is_arity_mismatch(&self) -> bool {
        matches!(self, CatalogError::ArityMismatch { .. })
    }
}

/// リポジトリ操作のエラー
///
/// 一意制約違反と外部キー違反は回復可能な種類として区別されます。
/// 行が見つからないことはエラーではなく `Ok(None)` で表現します。
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Unique constraint violation
    #[error("Conflict: {message}")]
    Conflict {
        /// エラーメッセージ
        message: String,
        /// 違反した制約名（取得できた場合）
        constraint: Option<String>,
    },

    /// Foreign key violation
    #[error("Foreign key violation: {message}")]
    ForeignKey {
        /// エラーメッセージ
        message: String,
        /// 違反した制約名（取得できた場合）
        constraint: Option<String>,
    },

    /// Stored document could not be decoded
    #[error("Failed to decode stored value: {message}")]
    Decode {
        /// エラーメッセージ
        message: String,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl RepositoryError {
    /// 一意制約違反かどうか
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict { .. })
    }

    /// 外部キー違反かどうか
    pub fn is_foreign_key(&self) -> bool {
        matches!(self, RepositoryError::ForeignKey { .. })
    }

    /// 回復可能なエラーかどうか
    pub fn is_recoverable(&self) -> bool {
        self.is_conflict() || self.is_foreign_key()
    }
}
