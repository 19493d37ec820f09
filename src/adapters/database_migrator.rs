// データベースマイグレーターサービス
//
// マイグレーション履歴テーブルの管理を担当するサービス。
// データベース固有のSQL構文を抽象化し、履歴の作成・記録・取得と
// テーブル存在確認を提供します。

use crate::core::config::Dialect;
use crate::core::error::DatabaseError;
use crate::core::migration::{Migration, MigrationHistory, MigrationRecord};
use crate::core::naming::HISTORY_TABLE;
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use tracing::warn;

/// データベースマイグレーターサービス
///
/// applied_at はどの方言でも RFC3339 文字列として保存する。
/// Anyドライバがタイムスタンプ型をデコードできないため。
#[derive(Debug, Clone, Default)]
pub struct DatabaseMigratorService {}

impl DatabaseMigratorService {
    /// 新しいDatabaseMigratorServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// マイグレーション履歴テーブル作成SQLを生成
    pub fn generate_create_migration_table_sql(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::PostgreSQL | Dialect::MySQL => format!(
                r#"CREATE TABLE IF NOT EXISTS {} (
    version VARCHAR(255) PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at VARCHAR(64) NOT NULL,
    checksum VARCHAR(64) NOT NULL
)"#,
                HISTORY_TABLE
            ),
            Dialect::SQLite => format!(
                r#"CREATE TABLE IF NOT EXISTS {} (
    version TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at TEXT NOT NULL,
    checksum TEXT NOT NULL
)"#,
                HISTORY_TABLE
            ),
        }
    }

    /// マイグレーション履歴テーブルを作成（存在しない場合のみ）
    pub async fn create_migration_table(
        &self,
        pool: &AnyPool,
        dialect: Dialect,
    ) -> Result<(), DatabaseError> {
        let sql = self.generate_create_migration_table_sql(dialect);

        sqlx::query(&sql)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::Query {
                message: format!("Failed to create migration history table: {}", e),
                sql: Some(sql),
            })?;

        Ok(())
    }

    /// マイグレーション記録のINSERTクエリを生成（パラメータバインド用）
    ///
    /// 戻り値は (SQL, バインドする値のリスト)。
    pub fn generate_record_migration_query(
        &self,
        migration: &Migration,
        dialect: Dialect,
    ) -> (String, Vec<String>) {
        let sql = format!(
            "INSERT INTO {} (version, description, applied_at, checksum) VALUES ({}, {}, {}, {})",
            HISTORY_TABLE,
            dialect.placeholder(1),
            dialect.placeholder(2),
            dialect.placeholder(3),
            dialect.placeholder(4),
        );
        let params = vec![
            migration.version.clone(),
            migration.description.clone(),
            migration.timestamp.to_rfc3339(),
            migration.checksum.clone(),
        ];
        (sql, params)
    }

    /// マイグレーション履歴取得のSELECT SQLを生成
    pub fn generate_get_migrations_sql(&self) -> String {
        format!(
            "SELECT version, description, applied_at, checksum FROM {} ORDER BY version",
            HISTORY_TABLE
        )
    }

    /// データベースからすべてのマイグレーション記録を取得
    pub async fn get_migrations(&self, pool: &AnyPool) -> Result<MigrationHistory, DatabaseError> {
        let sql = self.generate_get_migrations_sql();

        let rows = sqlx::query(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| DatabaseError::Query {
                message: format!("Failed to read migration history: {}", e),
                sql: Some(sql.clone()),
            })?;

        let records = rows
            .iter()
            .map(|row| {
                record_from_row(row).map_err(|e| DatabaseError::Query {
                    message: format!("Failed to decode migration history row: {}", e),
                    sql: Some(sql.clone()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MigrationHistory::new(records))
    }

    /// テーブル存在確認クエリを生成（パラメータバインド用）
    pub fn generate_table_exists_query(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::PostgreSQL => format!(
                "SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = {}",
                dialect.placeholder(1)
            ),
            Dialect::MySQL => format!(
                "SELECT 1 FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = {}",
                dialect.placeholder(1)
            ),
            Dialect::SQLite => format!(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = {}",
                dialect.placeholder(1)
            ),
        }
    }

    /// テーブルが存在するか確認
    pub async fn table_exists(
        &self,
        pool: &AnyPool,
        dialect: Dialect,
        table: &str,
    ) -> Result<bool, DatabaseError> {
        let sql = self.generate_table_exists_query(dialect);

        let row = sqlx::query(&sql)
            .bind(table)
            .fetch_optional(pool)
            .await
            .map_err(|e| DatabaseError::Query {
                message: format!("Failed to check whether table '{}' exists: {}", table, e),
                sql: Some(sql.clone()),
            })?;

        Ok(row.is_some())
    }
}

fn record_from_row(row: &AnyRow) -> Result<MigrationRecord, sqlx::Error> {
    let version: String = row.try_get("version")?;
    let applied_at_str: String = row.try_get("applied_at")?;

    let applied_at = DateTime::parse_from_rfc3339(&applied_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            warn!(
                version = %version,
                applied_at = %applied_at_str,
                "Unparseable applied_at in migration history"
            );
            DateTime::<Utc>::UNIX_EPOCH
        });

    Ok(MigrationRecord {
        version,
        description: row.try_get("description")?,
        applied_at,
        checksum: row.try_get("checksum")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_create_migration_table_sql() {
        let service = DatabaseMigratorService::new();

        for dialect in [Dialect::PostgreSQL, Dialect::MySQL, Dialect::SQLite] {
            let sql = service.generate_create_migration_table_sql(dialect);
            assert!(sql.contains("CREATE TABLE IF NOT EXISTS schema_migrations"));
            assert!(sql.contains("version"));
            assert!(sql.contains("applied_at"));
            assert!(sql.contains("checksum"));
        }
    }

    #[test]
    fn test_generate_record_migration_query_binds_values() {
        let service = DatabaseMigratorService::new();
        let migration = Migration::new(
            "20250101120000".to_string(),
            "create_accounts".to_string(),
            "abc123def456".to_string(),
        );

        let (sql, params) =
            service.generate_record_migration_query(&migration, Dialect::PostgreSQL);
        assert!(sql.contains("INSERT INTO schema_migrations"));
        assert!(sql.contains("$4"));
        assert!(!sql.contains("20250101120000"));
        assert_eq!(params.len(), 4);
        assert_eq!(params[0], "20250101120000");
        assert_eq!(params[1], "create_accounts");
        assert_eq!(params[3], "abc123def456");

        let (mysql, _) = service.generate_record_migration_query(&migration, Dialect::MySQL);
        assert!(mysql.contains("VALUES (?, ?, ?, ?)"));
    }

    #[test]
    fn test_generate_table_exists_query() {
        let service = DatabaseMigratorService::new();

        let pg = service.generate_table_exists_query(Dialect::PostgreSQL);
        assert!(pg.contains("information_schema.tables"));
        assert!(pg.contains("$1"));

        let sqlite = service.generate_table_exists_query(Dialect::SQLite);
        assert!(sqlite.contains("sqlite_master"));
        assert!(sqlite.contains("type = 'table'"));
    }

    #[tokio::test]
    async fn test_history_roundtrip_on_sqlite() {
        sqlx::any::install_default_drivers();
        let pool = sqlx::any::AnyPoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let service = DatabaseMigratorService::new();

        assert!(!service.table_exists(&pool, Dialect::SQLite, "schema_migrations").await.unwrap());
        service.create_migration_table(&pool, Dialect::SQLite).await.unwrap();
        // 2回目も成功する
        service.create_migration_table(&pool, Dialect::SQLite).await.unwrap();
        assert!(service.table_exists(&pool, Dialect::SQLite, "schema_migrations").await.unwrap());

        let migration = Migration::new(
            "20250101120000".to_string(),
            "create_accounts".to_string(),
            "abc".to_string(),
        );
        let (sql, params) = service.generate_record_migration_query(&migration, Dialect::SQLite);
        let mut query = sqlx::query(&sql);
        for param in &params {
            query = query.bind(param);
        }
        query.execute(&pool).await.unwrap();

        let history = service.get_migrations(&pool).await.unwrap();
        assert_eq!(history.count(), 1);
        let record = history.get_record("20250101120000").unwrap();
        assert_eq!(record.description, "create_accounts");
        assert!(record.verify_checksum("abc"));
        assert_eq!(record.applied_at.timestamp(), migration.timestamp.timestamp());
    }
}
