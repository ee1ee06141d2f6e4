use std::{
    env, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration, loaded from the environment (with `.env` support).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub bot_token: String,
    pub admin_user_id: i64,

    // Webhook boundary
    pub webhook_secret: String,
    /// When set, the bot serves the inbound webhook on this address
    /// instead of long polling.
    pub webhook_bind: Option<SocketAddr>,

    // Purchase prompt
    pub upi_id: String,
    pub admin_contact: String,
    pub qr_image_path: PathBuf,

    // Ledgers
    pub premium_file: PathBuf,
    pub usage_file: PathBuf,

    // Resolution
    pub host_marker: String,
    pub fetch_timeout: Duration,

    // Free tier
    pub free_window_hours: i64,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let bot_token = env_str("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_user_id = env_i64("ADMIN_USER_ID").ok_or_else(|| {
            Error::Config("ADMIN_USER_ID environment variable is required".to_string())
        })?;

        // Webhook
        let webhook_secret =
            env_str("WEBHOOK_SECRET").unwrap_or_else(|| "webhooksecret".to_string());
        let webhook_bind = match env_str("WEBHOOK_BIND").and_then(non_empty) {
            Some(raw) => Some(raw.trim().parse::<SocketAddr>().map_err(|e| {
                Error::Config(format!("WEBHOOK_BIND is not a socket address: {e}"))
            })?),
            None => None,
        };

        // Purchase prompt
        let upi_id = env_str("UPI_ID").unwrap_or_else(|| "yourupiid@upi".to_string());
        let admin_contact =
            env_str("ADMIN_CONTACT").unwrap_or_else(|| "@YourAdminUsername".to_string());
        let qr_image_path = env_path("QR_IMAGE_PATH").unwrap_or_else(|| PathBuf::from("qr.png"));

        // Ledgers
        let premium_file =
            env_path("PREMIUM_FILE").unwrap_or_else(|| PathBuf::from("premium_users.json"));
        let usage_file =
            env_path("USAGE_FILE").unwrap_or_else(|| PathBuf::from("usage_tracker.json"));

        // Resolution
        let host_marker = env_str("HOST_MARKER")
            .and_then(non_empty)
            .unwrap_or_else(|| "diskwala".to_string());
        let fetch_timeout = Duration::from_millis(env_u64("FETCH_TIMEOUT_MS").unwrap_or(15_000));

        // Free tier
        let free_window_hours = env_i64("FREE_WINDOW_HOURS").unwrap_or(24).max(1);

        Ok(Self {
            bot_token,
            admin_user_id,
            webhook_secret,
            webhook_bind,
            upi_id,
            admin_contact,
            qr_image_path,
            premium_file,
            usage_file,
            host_marker,
            fetch_timeout,
            free_window_hours,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
