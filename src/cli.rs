//! CLI argument definitions using clap derive macros.

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use guidelines_core::auth::{DEFAULT_LOGIN_URL, LoginConfig};
use guidelines_core::catalog::DEFAULT_CATALOG_URL;
use guidelines_core::config::{DEFAULT_DOWNLOAD_DIR, DEFAULT_INDEX_FILE};
use guidelines_core::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use guidelines_core::Settings;

/// Browse, download and read clinical practice guidelines.
///
/// Keeps a local copy of the guideline catalog fresh, downloads documents
/// (logging in when credentials are configured) and extracts text from
/// selected pages.
#[derive(Parser)]
#[command(name = "guidelines")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Account username for documents that require login
    #[arg(long, env = "NCCN_USERNAME")]
    pub username: Option<String>,

    /// Account password for documents that require login
    #[arg(long, env = "NCCN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory documents are downloaded into
    #[arg(long, env = "GUIDELINES_DOWNLOAD_DIR", default_value = DEFAULT_DOWNLOAD_DIR)]
    pub download_dir: PathBuf,

    /// Persisted guidelines index file
    #[arg(long, env = "GUIDELINES_INDEX_FILE", default_value = DEFAULT_INDEX_FILE)]
    pub index_file: PathBuf,

    /// Maximum age of the persisted index before it is refreshed (0-365 days)
    #[arg(long, env = "GUIDELINES_MAX_AGE_DAYS", default_value_t = 7, value_parser = clap::value_parser!(u64).range(0..=365))]
    pub max_age_days: u64,

    /// Catalog page the index is built from
    #[arg(long, env = "GUIDELINES_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Login page used to establish a session
    #[arg(long, env = "GUIDELINES_LOGIN_URL", default_value = DEFAULT_LOGIN_URL)]
    pub login_url: String,

    /// Connection timeout in seconds (1-300)
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub connect_timeout: u64,

    /// Read timeout in seconds (1-3600)
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the guidelines index, refreshing it when stale
    Index {
        /// Print the persisted YAML document instead of the listing
        #[arg(long)]
        raw: bool,
    },

    /// Refresh the guidelines index now, regardless of its age
    Refresh,

    /// Download a guideline document into the download directory
    Download {
        /// Document URL
        url: String,
    },

    /// Extract text from selected pages of a downloaded document
    Extract {
        /// Document path, relative to the download directory or absolute
        path: String,

        /// Pages to extract, e.g. "1,3,5-7" or "-1" for the last page
        #[arg(short, long, allow_hyphen_values = true)]
        pages: Option<String>,
    },
}

impl Args {
    /// Engine settings described by these arguments.
    pub fn settings(&self) -> Settings {
        Settings {
            download_dir: self.download_dir.clone(),
            index_file: self.index_file.clone(),
            catalog_url: self.catalog_url.clone(),
            login: LoginConfig::with_login_url(self.login_url.clone()),
            connect_timeout_secs: self.connect_timeout,
            read_timeout_secs: self.read_timeout,
            ..Settings::default()
        }
        .with_max_age_days(self.max_age_days)
        .with_credentials(self.username.clone(), self.password.clone())
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_dir", &self.download_dir)
            .field("index_file", &self.index_file)
            .field("max_age_days", &self.max_age_days)
            .field("catalog_url", &self.catalog_url)
            .field("login_url", &self.login_url)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("command", &self.command)
            .finish()
    }
}
