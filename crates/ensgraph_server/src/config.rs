//! Server configuration from command-line flags and environment variables.
//!
//! Every flag falls back to an environment variable, so deployments can be
//! configured purely through the environment.

use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};

pub const DEFAULT_PORT: u16 = 3002;

/// Deployment environment; controls whether error details reach clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }

    /// Storage and unexpected error causes are only returned in development.
    pub fn exposes_error_details(self) -> bool {
        self == Self::Development
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ENS friend graph HTTP API.
#[derive(Debug, Clone, Parser)]
#[command(name = "ensgraph-server", version, about, long_about = None)]
pub struct ServerConfig {
    /// Deployment environment.
    #[arg(long = "env", env = "APP_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite location: a path, `sqlite://<path>`, or `:memory:`.
    #[arg(long, env = "DATABASE_URL", default_value = "ensgraph.sqlite3")]
    pub database_url: String,

    /// Allowed CORS origin. Any origin is allowed when unset.
    #[arg(long, env = "CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Log level (trace|debug|info|warn|error). Defaults by build mode.
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files. Logs go to stderr when unset.
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<String>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
