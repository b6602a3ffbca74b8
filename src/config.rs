use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use toml;
use tracing::{info, warn};

/// Configuration for the notatki server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Address the HTTP server listens on, e.g. "127.0.0.1:3000"
    pub listen_addr: String,
    /// Directory for JSON log files; logging to file is off when unset
    pub log_directory: Option<PathBuf>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    /// Optional update for database URL
    #[serde(default)]
    pub database_url: Option<String>,
    /// Optional update for the listen address
    #[serde(default)]
    pub listen_addr: Option<String>,
    /// Optional update for the log directory
    #[serde(default)]
    pub log_directory: Option<PathBuf>,
}

/// Command line arguments for the application
#[derive(Parser, Debug)]
#[clap(name = "notatki", about = "A multi-user notes service")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to listen on, e.g. 127.0.0.1:3000
    #[clap(long, env = "NOTATKI_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Directory for JSON log files
    #[clap(long, env = "NOTATKI_LOG_DIRECTORY")]
    pub log_directory: Option<PathBuf>,

    /// Debug mode
    #[clap(long, env = "NOTATKI_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            listen_addr: update.listen_addr.unwrap_or(self.listen_addr),
            log_directory: update.log_directory.or(self.log_directory),
        }
    }
}

/// Returns the base (default) configuration
pub fn base_config(data_dir: Option<PathBuf>) -> Config {
    let database_url = data_dir.map_or("notatki.db".to_string(), |path| {
        path.join("notatki.db").to_string_lossy().to_string()
    });

    Config {
        database_url,
        listen_addr: "127.0.0.1:3000".to_string(),
        log_directory: None,
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    // Without a known config path there is nothing to load
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        listen_addr: args.listen_addr,
        log_directory: args.log_directory,
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: CliArgs) -> Config {
    let proj_dirs = ProjectDirs::from("com", "notatki", "notatki");
    if proj_dirs.is_none() {
        warn!("Could not determine XDG directories, skipping config file");
    }

    let config_path = proj_dirs
        .as_ref()
        .map(|dirs| dirs.config_dir().join("config.toml"));

    let data_dir = proj_dirs.as_ref().and_then(|dirs| {
        let path = dirs.data_dir().to_path_buf();
        if path.exists() {
            Some(path)
        } else {
            info!(
                "Data directory not found at {:?}, using working directory",
                path
            );
            None
        }
    });

    let base = base_config(data_dir);

    // Apply updates in order of increasing precedence
    let config = base
        .apply_update(config_from_file(config_path).unwrap_or_default())
        .apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, listen_addr={}, log_directory={:?}",
        config.database_url, config.listen_addr, config.log_directory
    );

    config
}
