//! Configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file (`--config`)
//! 4. Built-in default

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use phonebook_common::{Error, Result};
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_PATH: &str = "phonebook.db";
pub const DEFAULT_FILES_DIR: &str = "files";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Storage backend for the contact repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Contacts live in process memory and vanish on exit
    #[default]
    Memory,
    /// Contacts are stored in a SQLite database file
    Sqlite,
}

/// Command-line arguments for phonebook-server
#[derive(Parser, Debug, Default)]
#[command(name = "phonebook-server")]
#[command(about = "Contact management REST service")]
#[command(version)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "PHONEBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind to
    #[arg(long, env = "PHONEBOOK_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Storage backend
    #[arg(short, long, value_enum, env = "PHONEBOOK_BACKEND")]
    pub backend: Option<Backend>,

    /// SQLite database file (sqlite backend only)
    #[arg(short, long, env = "DATABASE_PATH")]
    pub database: Option<PathBuf>,

    /// Directory receiving uploaded files, served at /files
    #[arg(long, env = "PHONEBOOK_FILES_DIR")]
    pub files_dir: Option<PathBuf>,

    /// Largest accepted request body in bytes
    #[arg(long, env = "PHONEBOOK_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,
}

/// Bootstrap configuration loaded from a TOML file
///
/// Every key is optional; anything missing falls through to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backend: Option<Backend>,
    pub database_path: Option<PathBuf>,
    pub files_dir: Option<PathBuf>,
    pub max_upload_bytes: Option<usize>,
}

impl TomlConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }
}

/// Resolved server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub database_path: PathBuf,
    pub files_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Resolve from arguments, reading the TOML file they point at, if any
    pub fn load(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        Ok(Self::resolve(args, file))
    }

    /// Merge arguments over file settings over defaults
    pub fn resolve(args: Args, file: TomlConfig) -> Self {
        Self {
            host: args
                .host
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            backend: args.backend.or(file.backend).unwrap_or_default(),
            database_path: args
                .database
                .or(file.database_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            files_dir: args
                .files_dir
                .or(file.files_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FILES_DIR)),
            max_upload_bytes: args
                .max_upload_bytes
                .or(file.max_upload_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
