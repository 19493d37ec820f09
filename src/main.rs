use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use credstore::cli::commands::apply::{ApplyCommand, ApplyCommandHandler};
use credstore::cli::commands::init::{InitCommand, InitCommandHandler};
use credstore::cli::commands::lookup::{LookupCommand, LookupCommandHandler};
use credstore::cli::commands::queries::{QueriesCommand, QueriesCommandHandler};
use credstore::cli::commands::render_output;
use credstore::cli::commands::status::{StatusCommand, StatusCommandHandler};
use credstore::cli::{Cli, Commands};
use credstore::core::config::Dialect;
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    sqlx::any::install_default_drivers();

    // CLIをパースして実行
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する（RUST_LOGが指定されていればそちらを優先）
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });
    let format = cli.format;

    match cli.command {
        Commands::Init {
            dialect,
            database,
            force,
        } => {
            let dialect: Dialect = dialect.parse()?;
            let command = InitCommand {
                project_path,
                dialect,
                database,
                force,
            };
            let output = InitCommandHandler::new().execute(&command)?;
            render_output(&output, format)
        }

        Commands::Apply {
            dry_run,
            env,
            timeout,
        } => {
            let command = ApplyCommand {
                project_path,
                config_path,
                dry_run,
                env,
                timeout,
                format,
            };
            ApplyCommandHandler::new().execute(&command).await
        }

        Commands::Status { env } => {
            let command = StatusCommand {
                project_path,
                config_path,
                env,
                format,
            };
            StatusCommandHandler::new().execute(&command).await
        }

        Commands::Queries => {
            let command = QueriesCommand {
                project_path,
                config_path,
                format,
            };
            QueriesCommandHandler::new().execute(&command)
        }

        Commands::Lookup { email, env } => {
            let command = LookupCommand {
                project_path,
                config_path,
                email,
                env,
                format,
            };
            LookupCommandHandler::new().execute(&command).await
        }
    }
}
