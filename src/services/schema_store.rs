// スキーマストア
//
// バージョン順のマイグレーションを一度ずつ適用し、適用状態を履歴テーブルで管理する。
// 各マイグレーションは専用のトランザクション内で実行し、履歴の記録も同じ
// トランザクションで行う。

use crate::adapters::database_migrator::DatabaseMigratorService;
use crate::core::config::Dialect;
use crate::core::error::{DatabaseError, MigrationError, SchemaStoreError};
use crate::core::migration::{
    AppliedMigration, MigrationFile, MigrationHistory, MigrationStatusEntry,
};
use crate::core::naming::HISTORY_TABLE;
use crate::services::bundled::bundled_migrations;
use crate::services::migration_loader;
use crate::services::reference_checker::{self, created_tables, referenced_tables};
use crate::services::sql_splitter::split_sql_statements;
use chrono::Utc;
use serde::Serialize;
use sqlx::AnyPool;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// apply の結果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    /// 今回適用されたマイグレーション（適用順）
    pub applied: Vec<AppliedMigration>,
    /// 適用済みマイグレーションのチェックサム不一致などの警告
    pub warnings: Vec<String>,
}

impl ApplyReport {
    /// 何も適用されなかったかどうか
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }

    /// 合計の所要時間（ミリ秒）
    pub fn total_duration_ms(&self) -> i64 {
        self.applied.iter().map(|m| m.duration_ms).sum()
    }
}

/// スキーマストア
#[derive(Debug, Clone)]
pub struct SchemaStore {
    dialect: Dialect,
    migrations: Vec<MigrationFile>,
    migrator: DatabaseMigratorService,
}

impl SchemaStore {
    /// マイグレーションのリストからスキーマストアを作成
    ///
    /// リストはバージョン昇順に並べ替えられます。
    pub fn new(dialect: Dialect, mut migrations: Vec<MigrationFile>) -> Self {
        migrations.sort_by(|a, b| a.version.cmp(&b.version));
        Self {
            dialect,
            migrations,
            migrator: DatabaseMigratorService::new(),
        }
    }

    /// ディレクトリのマイグレーションファイルから作成
    pub fn from_dir(dialect: Dialect, dir: &Path) -> Result<Self, SchemaStoreError> {
        let migrations = migration_loader::load_from_dir(dir)?;
        Ok(Self::new(dialect, migrations))
    }

    /// 同梱マイグレーションから作成
    pub fn bundled(dialect: Dialect) -> Result<Self, SchemaStoreError> {
        let files = bundled_migrations(dialect).ok_or_else(|| SchemaStoreError::UnsupportedDialect {
            dialect: dialect.to_string(),
        })?;

        let migrations = migration_loader::from_sources(
            files
                .iter()
                .map(|file| (file.path.to_string(), file.contents.to_string(), None)),
        )?;
        Ok(Self::new(dialect, migrations))
    }

    /// データベース方言
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// バージョン昇順のマイグレーション
    pub fn migrations(&self) -> &[MigrationFile] {
        &self.migrations
    }

    /// 履歴に記録されていないマイグレーション
    pub fn pending<'a>(&'a self, history: &MigrationHistory) -> Vec<&'a MigrationFile> {
        self.migrations
            .iter()
            .filter(|m| !history.is_applied(&m.version))
            .collect()
    }

    /// 適用済みマイグレーションのうちファイル内容が変わったものへの警告
    pub fn checksum_warnings(&self, history: &MigrationHistory) -> Vec<String> {
        self.migrations
            .iter()
            .filter_map(|m| {
                let record = history.get_record(&m.version)?;
                (!record.verify_checksum(&m.checksum)).then(|| {
                    format!(
                        "Migration {} has been modified after it was applied (checksum mismatch)",
                        m.name()
                    )
                })
            })
            .collect()
    }

    /// 履歴を読み込む（履歴テーブルが無ければ空）
    pub async fn history(&self, pool: &AnyPool) -> Result<MigrationHistory, SchemaStoreError> {
        if !self
            .migrator
            .table_exists(pool, self.dialect, HISTORY_TABLE)
            .await?
        {
            return Ok(MigrationHistory::default());
        }
        Ok(self.migrator.get_migrations(pool).await?)
    }

    /// 各マイグレーションの状態を取得
    ///
    /// データベースには何も書き込みません。
    pub async fn status(
        &self,
        pool: &AnyPool,
    ) -> Result<Vec<MigrationStatusEntry>, SchemaStoreError> {
        let history = self.history(pool).await?;
        Ok(history.status_of(&self.migrations))
    }

    /// 未適用マイグレーションの参照先テーブルを確認
    ///
    /// 参照先は同じか前のマイグレーションで作成されるか、データベースに既に存在する
    /// 必要があります。違反があれば何も実行する前にエラーになります。
    pub async fn verify_references(
        &self,
        pool: &AnyPool,
        history: &MigrationHistory,
    ) -> Result<(), SchemaStoreError> {
        let (applied, pending): (Vec<&MigrationFile>, Vec<&MigrationFile>) = self
            .migrations
            .iter()
            .partition(|m| history.is_applied(&m.version));

        if pending.is_empty() {
            return Ok(());
        }

        // 同じか前のマイグレーションで作成されないテーブルだけをデータベースで確認する
        let mut created: BTreeSet<String> =
            applied.iter().flat_map(|m| created_tables(&m.sql)).collect();
        let mut existing = BTreeSet::new();
        for migration in &pending {
            created.extend(created_tables(&migration.sql));
            for table in referenced_tables(&migration.sql) {
                if created.contains(&table) || existing.contains(&table) {
                    continue;
                }
                if self.migrator.table_exists(pool, self.dialect, &table).await? {
                    existing.insert(table);
                }
            }
        }

        reference_checker::verify_references(&applied, &pending, &existing)?;
        Ok(())
    }

    /// 未適用のマイグレーションを順に適用
    ///
    /// 失敗したマイグレーションはロールバックされ、それより前のものは記録されたまま残ります。
    /// 2回目以降の実行で未適用のものが無ければ空のレポートを返します。
    pub async fn apply(&self, pool: &AnyPool) -> Result<ApplyReport, SchemaStoreError> {
        self.migrator.create_migration_table(pool, self.dialect).await?;
        let history = self.migrator.get_migrations(pool).await?;

        let warnings = self.checksum_warnings(&history);
        for warning in &warnings {
            warn!("{}", warning);
        }

        let pending = self.pending(&history);
        if pending.is_empty() {
            debug!("No pending migrations");
            return Ok(ApplyReport {
                applied: Vec::new(),
                warnings,
            });
        }

        self.verify_references(pool, &history).await?;

        let mut applied = Vec::with_capacity(pending.len());
        for migration in pending {
            applied.push(self.apply_migration(pool, migration).await?);
        }

        info!(count = applied.len(), "Applied migrations");
        Ok(ApplyReport { applied, warnings })
    }

    /// 1つのマイグレーションをトランザクション内で適用し、履歴に記録
    pub async fn apply_migration(
        &self,
        pool: &AnyPool,
        migration: &MigrationFile,
    ) -> Result<AppliedMigration, SchemaStoreError> {
        let started = Instant::now();
        debug!(
            version = %migration.version,
            description = %migration.description,
            "Applying migration"
        );

        let mut tx = pool.begin().await.map_err(|e| DatabaseError::Transaction {
            message: format!("Failed to start transaction for {}: {}", migration.name(), e),
        })?;

        for statement in split_sql_statements(&migration.sql) {
            if let Err(e) = sqlx::query(&statement).execute(&mut *tx).await {
                warn!(migration = %migration.name(), error = %e, "Migration statement failed");
                return Err(MigrationError::with_sql(
                    migration.version.clone(),
                    migration.description.clone(),
                    e.to_string(),
                    statement,
                )
                .into());
            }
        }

        let record = migration.to_migration();
        let (sql, params) = self
            .migrator
            .generate_record_migration_query(&record, self.dialect);
        let mut query = sqlx::query(&sql);
        for param in &params {
            query = query.bind(param);
        }
        if let Err(e) = query.execute(&mut *tx).await {
            return Err(MigrationError::with_sql(
                migration.version.clone(),
                migration.description.clone(),
                format!("failed to record migration history: {}", e),
                sql,
            )
            .into());
        }

        tx.commit().await.map_err(|e| DatabaseError::Transaction {
            message: format!("Failed to commit {}: {}", migration.name(), e),
        })?;

        let duration_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
        info!(
            version = %migration.version,
            description = %migration.description,
            duration_ms,
            "Migration applied"
        );

        Ok(AppliedMigration::new(
            migration.version.clone(),
            migration.description.clone(),
            Utc::now(),
            duration_ms,
        ))
    }
}
