//! Engine configuration from the environment.
//!
//! Supported environment variables:
//! - TESSERA_FRAMES: number of frames the binary runs (default 8)
//! - TESSERA_SCREEN_WIDTH / TESSERA_SCREEN_HEIGHT: initial surface size (default 1280x720)
//! - TESSERA_EVENT_BACKLOG_WARNING: events left in a topic after compaction
//!   before a warning is logged (default 256, 0 disables)
//! - TESSERA_LOG: fallback tracing filter when RUST_LOG is unset

use std::path::Path;
use std::str::FromStr;

use anyhow::{ensure, Context};

pub const DEFAULT_FRAMES: u64 = 8;
pub const DEFAULT_SCREEN_WIDTH: u32 = 1280;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 720;
pub const DEFAULT_BACKLOG_WARNING: usize = 256;
pub const DEFAULT_LOG_FILTER: &str = "tessera_engine=debug,tessera_modules=info,tessera_events=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub frames: u64,
    pub screen_width: u32,
    pub screen_height: u32,
    /// `None` disables backlog warnings.
    pub event_backlog_warning: Option<usize>,
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frames: DEFAULT_FRAMES,
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            event_backlog_warning: Some(DEFAULT_BACKLOG_WARNING),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults for
    /// missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let frames = parse_or(&lookup, "TESSERA_FRAMES", defaults.frames)?;
        let screen_width = parse_or(&lookup, "TESSERA_SCREEN_WIDTH", defaults.screen_width)?;
        let screen_height = parse_or(&lookup, "TESSERA_SCREEN_HEIGHT", defaults.screen_height)?;
        ensure!(
            screen_width > 0 && screen_height > 0,
            "Screen size must be positive, got {screen_width}x{screen_height}"
        );

        let backlog = parse_or(
            &lookup,
            "TESSERA_EVENT_BACKLOG_WARNING",
            DEFAULT_BACKLOG_WARNING,
        )?;
        let log_filter = lookup("TESSERA_LOG")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self {
            frames,
            screen_width,
            screen_height,
            event_backlog_warning: (backlog > 0).then_some(backlog),
            log_filter,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} is not a valid number: {raw:?}")),
        None => Ok(default),
    }
}

/// Load `.env.local` then `.env` from the repository root, if present.
///
/// Variables already set in the process environment win.
pub fn load_dotenv_from_repo_root() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");

    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            if let Err(error) = dotenvy::from_path(&path) {
                tracing::warn!(path = %path.display(), %error, "Failed to load env file");
            }
        }
    }
}
