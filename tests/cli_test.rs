/// CLIのテスト
///
/// 引数のパースと、一時ディレクトリ上のSQLiteプロジェクトに対する
/// init → apply → status → queries → lookup の一連の流れを確認します。
mod common;

#[cfg(test)]
mod cli_tests {
    use super::common;
    use clap::Parser;
    use credstore::adapters::database::DatabaseConnectionService;
    use credstore::cli::commands::apply::{ApplyCommand, ApplyCommandHandler};
    use credstore::cli::commands::init::{InitCommand, InitCommandHandler};
    use credstore::cli::commands::lookup::{LookupCommand, LookupCommandHandler};
    use credstore::cli::commands::queries::{QueriesCommand, QueriesCommandHandler};
    use credstore::cli::commands::status::{StatusCommand, StatusCommandHandler};
    use credstore::cli::{Cli, Commands, OutputFormat};
    use credstore::core::config::Dialect;
    use credstore::core::migration::MigrationStatus;
    use credstore::services::account_repository::AccountRepository;
    use credstore::services::query_catalog::QueryCatalog;
    use std::path::Path;
    use tempfile::TempDir;

    fn init_project(path: &Path) {
        InitCommandHandler::new()
            .execute(&InitCommand {
                project_path: path.to_path_buf(),
                dialect: Dialect::SQLite,
                database: None,
                force: false,
            })
            .unwrap();
    }

    fn apply_command(path: &Path, dry_run: bool) -> ApplyCommand {
        ApplyCommand {
            project_path: path.to_path_buf(),
            config_path: None,
            dry_run,
            env: "development".to_string(),
            timeout: Some(5),
            format: OutputFormat::Text,
        }
    }

    fn status_command(path: &Path) -> StatusCommand {
        StatusCommand {
            project_path: path.to_path_buf(),
            config_path: None,
            env: "development".to_string(),
            format: OutputFormat::Text,
        }
    }

    fn lookup_command(path: &Path, email: &str, format: OutputFormat) -> LookupCommand {
        LookupCommand {
            project_path: path.to_path_buf(),
            config_path: None,
            email: email.to_string(),
            env: "development".to_string(),
            format,
        }
    }

    /// グローバルフラグとサブコマンドのパーステスト
    #[test]
    fn test_parse_global_flags_and_subcommands() {
        let cli = Cli::try_parse_from([
            "credstore",
            "--format",
            "json",
            "--no-color",
            "lookup",
            "--email",
            "ana@example.com",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.no_color);
        match cli.command {
            Commands::Lookup { email, env } => {
                assert_eq!(email, "ana@example.com");
                assert_eq!(env, "development");
            }
            other => panic!("Expected Lookup command, got {:?}", other),
        }

        let cli = Cli::try_parse_from(["credstore", "apply", "--dry-run", "--env", "production"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Apply { dry_run: true, ref env, timeout: None } if env == "production"
        ));

        assert!(Cli::try_parse_from(["credstore", "init"]).is_err());
        assert!(Cli::try_parse_from(["credstore", "lookup"]).is_err());
    }

    /// SQLiteでの init → apply → status → queries → lookup の一連のテスト
    #[tokio::test]
    async fn test_full_workflow_on_sqlite() {
        let project = TempDir::new().unwrap();
        init_project(project.path());

        // 適用前はすべて未適用、dry run は何も変更しない
        let status = StatusCommandHandler::new()
            .run(&status_command(project.path()))
            .await
            .unwrap();
        assert_eq!(status.summary.pending, 3);

        let dry_run = ApplyCommandHandler::new()
            .run(&apply_command(project.path(), true))
            .await
            .unwrap();
        assert_eq!(dry_run.pending.len(), 3);
        assert!(dry_run.applied.is_empty());

        let applied = ApplyCommandHandler::new()
            .run(&apply_command(project.path(), false))
            .await
            .unwrap();
        assert_eq!(applied.applied.len(), 3);

        let again = ApplyCommandHandler::new()
            .execute(&apply_command(project.path(), false))
            .await
            .unwrap();
        assert!(again.contains("up to date"));

        let status = StatusCommandHandler::new()
            .run(&status_command(project.path()))
            .await
            .unwrap();
        assert_eq!(status.summary.applied, 3);
        assert!(status
            .migrations
            .iter()
            .all(|entry| entry.status == MigrationStatus::Applied));

        let queries = QueriesCommandHandler::new()
            .execute(&QueriesCommand {
                project_path: project.path().to_path_buf(),
                config_path: None,
                format: OutputFormat::Text,
            })
            .unwrap();
        assert!(queries.contains("get-user-by-mail"));

        // プロジェクトのデータベースにアカウントを直接登録
        let db_path = project.path().join("credstore.db");
        let pool = DatabaseConnectionService::new()
            .connect_url(&format!("sqlite://{}?mode=rwc", db_path.display()), Some(5))
            .await
            .unwrap();
        let catalog = QueryCatalog::bundled(Dialect::SQLite).unwrap();
        AccountRepository::new(&pool, &catalog)
            .create(&common::new_account("Ana", "ana@example.com", "x"))
            .await
            .unwrap();
        pool.close().await;

        let found = LookupCommandHandler::new()
            .execute(&lookup_command(project.path(), "ana@example.com", OutputFormat::Json))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&found).unwrap();
        assert_eq!(value["account"]["name"], "Ana");
        assert_eq!(value["account"]["password_plain"], "x");

        let missing = LookupCommandHandler::new()
            .execute(&lookup_command(project.path(), "nobody@example.com", OutputFormat::Text))
            .await
            .unwrap();
        assert_eq!(missing, "No account found for nobody@example.com");
    }

    /// 未初期化のプロジェクトでエラーになるテスト
    #[tokio::test]
    async fn test_commands_require_initialized_project() {
        let project = TempDir::new().unwrap();

        let error = StatusCommandHandler::new()
            .execute(&status_command(project.path()))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Config file not found"));
    }
}
