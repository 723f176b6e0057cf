use std::{env, path::PathBuf, str::FromStr};

use log::LevelFilter;

use crate::{
    catalog::Catalog,
    core::SQLError,
    storage::{open_storage, StorageEngine},
};

/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV: &str = "SPJQL_LOG";
/// Environment variable enabling the hash join strategy when set to `1`.
pub const HASH_JOIN_ENV: &str = "SPJQL_HASH_JOIN";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of the sled database. In-memory storage when absent.
    pub data_dir: Option<PathBuf>,
    pub log_level: LevelFilter,
    pub enable_hash_join: bool,
    /// Largest right-side relation, in rows, a hash join will build on.
    pub hash_join_max_build_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: LevelFilter::Info,
            enable_hash_join: false,
            hash_join_max_build_rows: 1024,
        }
    }
}

impl Config {
    /// Build a config from process arguments (first positional argument is
    /// the data directory) and the environment.
    pub fn from_env(mut args: impl Iterator<Item = String>) -> Self {
        let mut config = Self {
            data_dir: args.nth(1).map(PathBuf::from),
            ..Self::default()
        };

        if let Some(level) = env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|v| LevelFilter::from_str(&v).ok())
        {
            config.log_level = level;
        }
        config.enable_hash_join = env::var(HASH_JOIN_ENV).map_or(false, |v| v == "1");

        config
    }
}

/// The context stores all the information needed to plan and execute a
/// statement. It is created once at startup and passed by reference.
pub struct QueryContext {
    pub catalog: Catalog,
    pub storage: Box<dyn StorageEngine>,
    pub config: Config,
}

impl QueryContext {
    /// Open the configured storage engine and load the catalog from it.
    pub fn open(config: Config) -> Result<Self, SQLError> {
        let storage = open_storage(&config)?;
        Self::with_storage(storage, config)
    }

    pub fn with_storage(storage: Box<dyn StorageEngine>, config: Config) -> Result<Self, SQLError> {
        let catalog = Catalog::load(storage.as_ref())?;
        Ok(Self {
            catalog,
            storage,
            config,
        })
    }

    /// Flush storage. The context is consumed either way.
    pub fn close(self) -> Result<(), SQLError> {
        self.storage.flush()
    }
}
