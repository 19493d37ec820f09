// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// Credstore - account and passkey credential storage
#[derive(Parser, Debug)]
#[command(name = "credstore")]
#[command(author = "Credstore Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Schema migrations and named queries for account and passkey storage")]
#[command(long_about = "Credstore - account and passkey credential storage

Applies the bundled, timestamp-ordered schema migrations exactly once and
runs the named queries of the query catalog against the resulting tables.

Supported databases: PostgreSQL, SQLite (MySQL connections without bundled files)")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Initialize a new project:     credstore init --dialect sqlite
  2. Apply migrations:             credstore apply
  3. Check migration status:       credstore status
  4. Look up an account:           credstore lookup --email ana@example.com

For detailed help on each command, use: credstore <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new project
    ///
    /// Writes .credstore.yaml and copies the bundled migrations and
    /// queries for the chosen dialect into the project.
    ///
    /// EXAMPLES:
    ///   credstore init --dialect sqlite
    ///   credstore init --dialect postgresql --database credstore
    Init {
        /// Database dialect (postgresql, sqlite)
        #[arg(short, long, value_name = "DIALECT")]
        dialect: String,

        /// Database name (file path for SQLite)
        #[arg(long, value_name = "NAME")]
        database: Option<String>,

        /// Force initialization even if config exists
        #[arg(short, long)]
        force: bool,
    },

    /// Apply pending migrations to the database
    ///
    /// EXAMPLES:
    ///   credstore apply
    ///   credstore apply --dry-run
    ///   credstore apply --env production --timeout 30
    Apply {
        /// Dry run - show pending SQL without executing
        #[arg(long)]
        dry_run: bool,

        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,

        /// Connection timeout in seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },

    /// Show migration status
    Status {
        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,
    },

    /// List the named queries of the catalog
    Queries,

    /// Look up an account by email (get-user-by-mail)
    Lookup {
        /// Email address to look up
        #[arg(long, value_name = "EMAIL")]
        email: String,

        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,
    },
}
