use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub text_service_url: String,
    pub image_service_url: String,
    pub images_dir: PathBuf,
    pub brochures_dir: PathBuf,
    /// Both unset means the embedded DejaVu faces.
    pub font_regular_path: Option<PathBuf>,
    pub font_bold_path: Option<PathBuf>,
    pub collaborator_timeout: Duration,
    pub collaborator_max_attempts: u32,
    pub collaborator_backoff: Duration,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window: Duration,
    pub export_pdf: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            port: parse_var(&lookup, "PORT", 8080)?,
            rust_log: var("RUST_LOG", "info"),
            text_service_url: var("TEXT_SERVICE_URL", "http://127.0.0.1:8005/generate"),
            image_service_url: var(
                "IMAGE_SERVICE_URL",
                "http://127.0.0.1:7860/sdapi/v1/txt2img",
            ),
            images_dir: PathBuf::from(var("IMAGES_DIR", "generated_images")),
            brochures_dir: PathBuf::from(var("BROCHURES_DIR", "generated_brochures")),
            font_regular_path: lookup("FONT_REGULAR_PATH").map(PathBuf::from),
            font_bold_path: lookup("FONT_BOLD_PATH").map(PathBuf::from),
            collaborator_timeout: Duration::from_secs(parse_var(
                &lookup,
                "COLLABORATOR_TIMEOUT_SECS",
                10,
            )?),
            collaborator_max_attempts: parse_var(&lookup, "COLLABORATOR_MAX_ATTEMPTS", 3)?,
            collaborator_backoff: Duration::from_millis(parse_var(
                &lookup,
                "COLLABORATOR_BACKOFF_MS",
                3000,
            )?),
            rate_limit_max_requests: parse_var(&lookup, "RATE_LIMIT_MAX_REQUESTS", 100)?,
            rate_limit_window: Duration::from_secs(parse_var(
                &lookup,
                "RATE_LIMIT_WINDOW_SECS",
                3600,
            )?),
            export_pdf: parse_var(&lookup, "EXPORT_PDF", true)?,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}
