// Adapters
// データベースへのアクセスを抽象化

pub mod connection_string;
pub mod database;
pub mod database_migrator;
pub mod sql_error;
