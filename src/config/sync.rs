// src/config/sync.rs
use anyhow::{Context, Result};
use std::{env, path::PathBuf, time::Duration};

pub const ENV_SHEETS_ID: &str = "GOOGLE_SHEETS_ID";
pub const ENV_CREDENTIAL_PATH: &str = "GOOGLE_SERVICE_ACCOUNT_PATH";
pub const ENV_DATA_DIR: &str = "CMS_DATA_DIR";
pub const ENV_IMAGES_DIR: &str = "CMS_IMAGES_DIR";
pub const ENV_SHEETS_API_BASE: &str = "SHEETS_API_BASE_URL";
pub const ENV_IMAGE_BASE: &str = "CMS_IMAGE_BASE_URL";
pub const ENV_HTTP_TIMEOUT: &str = "CMS_HTTP_TIMEOUT_SECS";
pub const ENV_SEED_PATH: &str = "SHEET_SEED_PATH";

pub const DEFAULT_SHEETS_ID: &str = "1twV7lZqXy_rAnLW9lzddLyEvmNpwHsiDW6lwnfggMrc";
pub const DEFAULT_CREDENTIAL_PATH: &str = "service-account-key.json";
pub const DEFAULT_DATA_DIR: &str = "src/data";
pub const DEFAULT_IMAGES_DIR: &str = "src/assets/images/cms";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
/// Direct-download host for mirrored Drive images (`{base}/{file_id}`).
pub const DEFAULT_IMAGE_BASE: &str = "https://lh3.googleusercontent.com/d";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SEED_PATH: &str = "config/sheet_seed.toml";
/// Requests allowed per image download, the first one included.
pub const MAX_REDIRECTS: u8 = 5;

/// Everything the sync components need, resolved once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub spreadsheet_id: String,
    pub credential_path: PathBuf,
    /// Where `events.json`, `gallery.json` and `committee.json` live.
    pub data_dir: PathBuf,
    /// Local image mirror; snapshot values point here as `cms/<file>`.
    pub images_dir: PathBuf,
    pub sheets_api_base: String,
    pub image_base: String,
    pub http_timeout: Duration,
    /// Request budget for one image download (redirects followed = budget - 1).
    pub max_redirects: u8,
    pub seed_path: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SHEETS_ID.to_string(),
            credential_path: PathBuf::from(DEFAULT_CREDENTIAL_PATH),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            sheets_api_base: DEFAULT_SHEETS_API_BASE.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_redirects: MAX_REDIRECTS,
            seed_path: PathBuf::from(DEFAULT_SEED_PATH),
        }
    }
}

impl SyncConfig {
    /// Build from the process environment, falling back to defaults per key.
    /// Callers load `.env` (dotenvy) before this.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(v) = non_empty_var(ENV_SHEETS_ID) {
            cfg.spreadsheet_id = v;
        }
        if let Some(v) = non_empty_var(ENV_CREDENTIAL_PATH) {
            cfg.credential_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty_var(ENV_DATA_DIR) {
            cfg.data_dir = PathBuf::from(v);
        }
        if let Some(v) = non_empty_var(ENV_IMAGES_DIR) {
            cfg.images_dir = PathBuf::from(v);
        }
        if let Some(v) = non_empty_var(ENV_SHEETS_API_BASE) {
            cfg.sheets_api_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty_var(ENV_IMAGE_BASE) {
            cfg.image_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty_var(ENV_HTTP_TIMEOUT) {
            let secs: u64 = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_HTTP_TIMEOUT} must be a whole number of seconds"))?;
            cfg.http_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(v) = non_empty_var(ENV_SEED_PATH) {
            cfg.seed_path = PathBuf::from(v);
        }

        Ok(cfg)
    }

    /// All paths rooted under `root` (tests, alternate checkouts).
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            credential_path: root.join(DEFAULT_CREDENTIAL_PATH),
            data_dir: root.join(DEFAULT_DATA_DIR),
            images_dir: root.join(DEFAULT_IMAGES_DIR),
            seed_path: root.join(DEFAULT_SEED_PATH),
            ..Self::default()
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
