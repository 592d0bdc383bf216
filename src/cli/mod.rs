pub mod down;
pub mod status;
pub mod up;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dbmigrate")]
#[command(version)]
#[command(about = "Apply and roll back SQL/CQL schema migrations", long_about = None)]
pub struct Cli {
    /// Path to an `EngineConfig` TOML file; missing is not an error.
    #[arg(long, default_value = "dbmigrate.toml")]
    pub config: PathBuf,

    /// Database connection URL.
    #[arg(long, env = "DBMIGRATE_URL")]
    pub url: Option<String>,

    /// Driver name (postgres, mysql, sqlite3, cql). Inferred from the URL
    /// scheme when omitted.
    #[arg(long, env = "DBMIGRATE_DRIVER")]
    pub driver: Option<String>,

    /// Directory containing `.sql` migration files, searched recursively.
    #[arg(long, default_value = "./migrations")]
    pub migrations_dir: PathBuf,

    /// Schema to namespace the bookkeeping table under (Postgres only).
    #[arg(long)]
    pub schema: Option<String>,

    /// Transaction mode: all, per-file, or none. Falls back to
    /// `default_mode` in the config file when not passed.
    #[arg(long)]
    pub mode: Option<String>,

    /// Skip advisory locking. Required on drivers that don't support it.
    #[arg(long)]
    pub no_lock: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply every pending up-migration.
    Up,
    /// Roll back the most recently applied migrations.
    Down {
        /// Number of migrations to roll back.
        #[arg(default_value = "1")]
        n: usize,
    },
    /// Show applied and pending migrations.
    Status,
}
