use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

static DATA_DIR_NAME: &str = "yatube";
static YATUBE_DB_NAME: &str = "yatube_db.sqlite";
static CONFIG_FILE_NAME: &str = "config.json";

// data_dir_path
// |- yatube
//    |- yatube_db.sqlite
//    |- config.json

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no data directory on this platform")]
    NoDataDir,
    #[error("config io error")]
    Io(#[from] std::io::Error),
    #[error("malformed config file")]
    Json(#[from] serde_json::Error),
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_posts_per_page() -> u64 {
    10
}

fn default_index_cache_ttl_secs() -> u64 {
    20
}

fn default_login_url() -> String {
    "/auth/login/".to_string()
}

fn default_remote_user_header() -> String {
    "x-remote-user".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct YatubeConfig {
    pub database_path: PathBuf,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Page size shared by every feed.
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: u64,

    /// How long a rendered index page is served from cache.
    #[serde(default = "default_index_cache_ttl_secs")]
    pub index_cache_ttl_secs: u64,

    /// Where anonymous visitors of protected pages are sent.
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Header carrying the username established by the upstream auth layer.
    #[serde(default = "default_remote_user_header")]
    pub remote_user_header: String,
}

impl YatubeConfig {
    /// Creates a config with defaults, keeping the database inside `data_dir`
    pub fn new(data_dir: &Path) -> Self {
        YatubeConfig {
            database_path: data_dir.join(YATUBE_DB_NAME),
            bind_address: default_bind_address(),
            port: default_port(),
            posts_per_page: default_posts_per_page(),
            index_cache_ttl_secs: default_index_cache_ttl_secs(),
            login_url: default_login_url(),
            remote_user_header: default_remote_user_header(),
        }
    }

    pub fn index_cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.index_cache_ttl_secs)
    }
}

/// Gets the existing config or initializes a new one under the platform data directory
pub async fn get_or_init() -> Result<YatubeConfig, ConfigError> {
    let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    get_or_init_in(&data_dir.join(DATA_DIR_NAME)).await
}

/// Gets the config stored in `yatube_dir`, writing a default one if missing
pub async fn get_or_init_in(yatube_dir: &Path) -> Result<YatubeConfig, ConfigError> {
    let config_path = yatube_dir.join(CONFIG_FILE_NAME);

    fs::create_dir_all(yatube_dir).await?;

    if config_path.exists() {
        let mut file = fs::File::open(&config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let config: YatubeConfig = serde_json::from_str(&contents)?;
        Ok(config)
    } else {
        let config = YatubeConfig::new(yatube_dir);

        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(&config_path).await?;
        file.write_all(json.as_bytes()).await?;

        tracing::info!(path = %config_path.display(), "wrote default config");
        Ok(config)
    }
}
