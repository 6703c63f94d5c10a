use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::retry::BackoffPolicy;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "jobstats-scraper",
    about = "Scrape job postings listed in task files and store them in Postgres"
)]
pub struct Config {
    #[command(flatten)]
    pub db: DbConfig,

    #[command(flatten)]
    pub fetch: FetchConfig,

    /// Create the tables before scraping
    #[arg(long, env = "ENSURE_SCHEMA", default_value_t = true, action = clap::ArgAction::Set)]
    pub ensure_schema: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Scrape every task file and store the results (default when no subcommand given)
    Run {
        /// Directory holding the task-source JSON files
        #[arg(long, env = "TASKS_DIR", default_value = "tasks")]
        tasks_dir: PathBuf,
    },
    /// Create the tables if they do not exist, then exit
    InitSchema,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Mutual-TLS Postgres parameters. Certificates and key are PEM contents,
/// not paths.
#[derive(clap::Args, Clone)]
pub struct DbConfig {
    #[arg(long = "db-host", env = "DB_HOST")]
    pub host: String,

    #[arg(long = "db-port", env = "DB_PORT", default_value_t = 5432)]
    pub port: u16,

    #[arg(long = "db-user", env = "DB_USER")]
    pub user: String,

    #[arg(long = "db-password", env = "DB_USER_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long = "db-name", env = "DB_NAME")]
    pub name: String,

    /// Server root CA certificate (PEM)
    #[arg(long = "db-root-cert", env = "DB_ROOT_CERT", hide_env_values = true)]
    pub root_cert: String,

    /// Client certificate (PEM)
    #[arg(long = "db-cert", env = "DB_CERT", hide_env_values = true)]
    pub client_cert: String,

    /// Client private key (PEM)
    #[arg(long = "db-key", env = "DB_KEY", hide_env_values = true)]
    pub client_key: String,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct FetchConfig {
    /// Attempts per URL while the site answers 429
    #[arg(long, env = "FETCH_MAX_ATTEMPTS", default_value_t = 10)]
    pub max_attempts: u32,

    /// First backoff wait in milliseconds, doubled on every retry
    #[arg(long, env = "FETCH_BASE_DELAY_MS", default_value_t = 500)]
    pub base_delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    #[arg(
        long,
        env = "FETCH_USER_AGENT",
        default_value = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
    )]
    pub user_agent: String,
}

impl FetchConfig {
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Resolve the command, defaulting to Run if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run {
            tasks_dir: std::env::var("TASKS_DIR")
                .unwrap_or_else(|_| "tasks".to_string())
                .into(),
        })
    }
}
