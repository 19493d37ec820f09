/// スキーマストアの統合テスト
///
/// SQLiteファイルに対して同梱マイグレーションとディレクトリのマイグレーションを適用し、
/// 冪等性・参照チェック・失敗時の履歴・状態表示を確認します。
mod common;

#[cfg(test)]
mod schema_store_tests {
    use super::common;
    use credstore::adapters::database_migrator::DatabaseMigratorService;
    use credstore::core::config::Dialect;
    use credstore::core::migration::MigrationStatus;
    use credstore::services::schema_store::SchemaStore;
    use std::fs;
    use tempfile::TempDir;

    const CREATE_ACCOUNTS: &str = "CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE
);
";
    const CREATE_CREDENTIALS: &str = "CREATE TABLE IF NOT EXISTS passkey_user_credentials (
    credential_id BLOB PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES passkey_users (id)
);
";

    fn write_migration(dir: &TempDir, name: &str, sql: &str) {
        fs::write(dir.path().join(name), sql).unwrap();
    }

    /// 同梱マイグレーションの2回目の適用は何もしないテスト
    #[tokio::test]
    async fn test_apply_twice_is_noop() {
        let (_temp_dir, pool) = common::sqlite_pool().await;
        let store = SchemaStore::bundled(Dialect::SQLite).unwrap();

        let first = store.apply(&pool).await.unwrap();
        let versions: Vec<_> = first.applied.iter().map(|m| m.version.as_str()).collect();
        assert_eq!(versions, vec!["20250101120000", "20250101120100", "20250101120200"]);

        let second = store.apply(&pool).await.unwrap();
        assert!(second.is_noop());

        let history = store.history(&pool).await.unwrap();
        assert_eq!(history.count(), 3);
        assert_eq!(history.latest_version(), Some("20250101120200"));
    }

    /// 参照先テーブルが無い場合に何も実行せず失敗するテスト
    #[tokio::test]
    async fn test_missing_referenced_table_fails_before_anything_runs() {
        let migrations = TempDir::new().unwrap();
        write_migration(&migrations, "20250101120000_create_accounts.sql", CREATE_ACCOUNTS);
        write_migration(
            &migrations,
            "20250101120200_create_passkey_user_credentials.sql",
            CREATE_CREDENTIALS,
        );

        let (_temp_dir, pool) = common::sqlite_pool().await;
        let store = SchemaStore::from_dir(Dialect::SQLite, migrations.path()).unwrap();

        let error = store.apply(&pool).await.unwrap_err();
        assert!(error.is_migration());
        let message = error.to_string();
        assert!(message.contains("20250101120200_create_passkey_user_credentials"));
        assert!(message.contains("passkey_users"));

        let migrator = DatabaseMigratorService::new();
        assert!(!migrator
            .table_exists(&pool, Dialect::SQLite, "accounts")
            .await
            .unwrap());
        assert_eq!(store.history(&pool).await.unwrap().count(), 0);
    }

    /// データベースに既存のテーブルが参照先を満たすテスト
    #[tokio::test]
    async fn test_reference_to_table_already_in_database() {
        let (_temp_dir, pool) = common::sqlite_pool().await;
        sqlx::query("CREATE TABLE passkey_users (id TEXT PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();

        let migrations = TempDir::new().unwrap();
        write_migration(
            &migrations,
            "20250101120200_create_passkey_user_credentials.sql",
            CREATE_CREDENTIALS,
        );
        let store = SchemaStore::from_dir(Dialect::SQLite, migrations.path()).unwrap();

        let report = store.apply(&pool).await.unwrap();
        assert_eq!(report.applied.len(), 1);
    }

    /// 失敗したマイグレーションのロールバックと再実行時の再開テスト
    #[tokio::test]
    async fn test_failed_migration_is_rolled_back_and_rerun_resumes() {
        let migrations = TempDir::new().unwrap();
        write_migration(&migrations, "20250101120000_create_accounts.sql", CREATE_ACCOUNTS);
        write_migration(
            &migrations,
            "20250101120100_broken.sql",
            "CREATE TABLE IF NOT EXISTS partial (id INTEGER);\nCREATE TABLE oops (;\n",
        );

        let (_temp_dir, pool) = common::sqlite_pool().await;
        let store = SchemaStore::from_dir(Dialect::SQLite, migrations.path()).unwrap();

        let error = store.apply(&pool).await.unwrap_err();
        let failed = error.migration_error().unwrap();
        assert_eq!(failed.migration_name(), "20250101120100_broken");

        let history = store.history(&pool).await.unwrap();
        assert!(history.is_applied("20250101120000"));
        assert!(!history.is_applied("20250101120100"));
        let migrator = DatabaseMigratorService::new();
        assert!(!migrator
            .table_exists(&pool, Dialect::SQLite, "partial")
            .await
            .unwrap());

        // 修正後の再実行は失敗したものから再開する
        write_migration(
            &migrations,
            "20250101120100_broken.sql",
            "CREATE TABLE IF NOT EXISTS partial (id INTEGER);\n",
        );
        let store = SchemaStore::from_dir(Dialect::SQLite, migrations.path()).unwrap();
        let report = store.apply(&pool).await.unwrap();
        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.applied[0].version, "20250101120100");
    }

    /// 適用済み・未適用・孤立・チェックサム不一致の状態表示テスト
    #[tokio::test]
    async fn test_status_reports_every_state() {
        let migrations = TempDir::new().unwrap();
        write_migration(&migrations, "20250101120000_create_accounts.sql", CREATE_ACCOUNTS);
        write_migration(
            &migrations,
            "20250101120100_create_sessions.sql",
            "CREATE TABLE IF NOT EXISTS sessions (id INTEGER);\n",
        );
        write_migration(
            &migrations,
            "20250101120200_create_tokens.sql",
            "CREATE TABLE IF NOT EXISTS tokens (id INTEGER);\n",
        );

        let (_temp_dir, pool) = common::sqlite_pool().await;
        SchemaStore::from_dir(Dialect::SQLite, migrations.path())
            .unwrap()
            .apply(&pool)
            .await
            .unwrap();

        // 1つ目を変更、3つ目を削除、4つ目を追加
        write_migration(
            &migrations,
            "20250101120000_create_accounts.sql",
            "CREATE TABLE IF NOT EXISTS accounts (id INTEGER PRIMARY KEY);\n",
        );
        fs::remove_file(migrations.path().join("20250101120200_create_tokens.sql")).unwrap();
        write_migration(
            &migrations,
            "20250101120300_create_audit.sql",
            "CREATE TABLE IF NOT EXISTS audit (id INTEGER);\n",
        );

        let store = SchemaStore::from_dir(Dialect::SQLite, migrations.path()).unwrap();
        let status = store.status(&pool).await.unwrap();
        let states: Vec<_> = status.iter().map(|e| (e.version.as_str(), e.status)).collect();
        assert_eq!(
            states,
            vec![
                ("20250101120000", MigrationStatus::AppliedChecksumMismatch),
                ("20250101120100", MigrationStatus::Applied),
                ("20250101120200", MigrationStatus::Orphaned),
                ("20250101120300", MigrationStatus::Pending),
            ]
        );

        // チェックサム不一致は警告として報告され、未適用のものは適用される
        let report = store.apply(&pool).await.unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("20250101120000_create_accounts"));
        assert_eq!(report.applied.len(), 1);
    }

    /// ブロックコメント内の `;` で文が分割されないテスト
    #[tokio::test]
    async fn test_block_comment_with_semicolon_is_applied() {
        let migrations = TempDir::new().unwrap();
        write_migration(
            &migrations,
            "20250101120000_create_a.sql",
            "/* creates a; nothing else */\nCREATE TABLE IF NOT EXISTS a (id INTEGER);\n\
             /* seed; one row */\nINSERT INTO a (id) VALUES (1);\n",
        );

        let (_temp_dir, pool) = common::sqlite_pool().await;
        let store = SchemaStore::from_dir(Dialect::SQLite, migrations.path()).unwrap();

        let report = store.apply(&pool).await.unwrap();
        assert_eq!(report.applied.len(), 1);
        let migrator = DatabaseMigratorService::new();
        assert!(migrator
            .table_exists(&pool, Dialect::SQLite, "a")
            .await
            .unwrap());
    }

    /// コメントや文字列リテラル内の REFERENCES は参照として扱わないテスト
    #[tokio::test]
    async fn test_references_in_comments_and_literals_are_ignored() {
        let migrations = TempDir::new().unwrap();
        write_migration(
            &migrations,
            "20250101120000_create_accounts.sql",
            "CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER /* was: REFERENCES legacy_users (id) */,
    note TEXT DEFAULT 'REFERENCES archived_users (id)'
);
",
        );

        let (_temp_dir, pool) = common::sqlite_pool().await;
        let store = SchemaStore::from_dir(Dialect::SQLite, migrations.path()).unwrap();

        let report = store.apply(&pool).await.unwrap();
        assert_eq!(report.applied.len(), 1);
    }

    /// 後のマイグレーションで作成されるテーブルでも、データベースに既存なら参照先を満たすテスト
    #[tokio::test]
    async fn test_existing_table_created_again_by_later_migration() {
        let (_temp_dir, pool) = common::sqlite_pool().await;
        sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();

        let migrations = TempDir::new().unwrap();
        write_migration(
            &migrations,
            "20250101120000_create_sessions.sql",
            "CREATE TABLE IF NOT EXISTS sessions (user_id INTEGER REFERENCES users (id));\n",
        );
        write_migration(
            &migrations,
            "20250101120100_create_users.sql",
            "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY);\n",
        );
        let store = SchemaStore::from_dir(Dialect::SQLite, migrations.path()).unwrap();

        let report = store.apply(&pool).await.unwrap();
        assert_eq!(report.applied.len(), 2);
    }

    /// 後のマイグレーションでしか作成されないテーブルへの参照は失敗するテスト
    #[tokio::test]
    async fn test_reference_to_table_created_later_fails() {
        let (_temp_dir, pool) = common::sqlite_pool().await;

        let migrations = TempDir::new().unwrap();
        write_migration(
            &migrations,
            "20250101120000_create_sessions.sql",
            "CREATE TABLE IF NOT EXISTS sessions (user_id INTEGER REFERENCES users (id));\n",
        );
        write_migration(
            &migrations,
            "20250101120100_create_users.sql",
            "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY);\n",
        );
        let store = SchemaStore::from_dir(Dialect::SQLite, migrations.path()).unwrap();

        let error = store.apply(&pool).await.unwrap_err();
        assert!(error.to_string().contains("20250101120000_create_sessions"));
        assert_eq!(store.history(&pool).await.unwrap().count(), 0);
    }
}
