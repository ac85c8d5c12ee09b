use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_YTDLP_BIN: &str = "yt-dlp";
const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONCURRENT: u32 = 3;
const DEFAULT_PAGE_SIZE: usize = 50;

/// Settings handed to the extraction strategies.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Path (or name on `PATH`) of the yt-dlp binary.
    pub ytdlp_bin: PathBuf,
    /// Wall-clock limit for one tool invocation.
    pub extract_timeout: Duration,
    /// Limit for strategies that fetch pages directly.
    pub fetch_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: PathBuf::from(DEFAULT_YTDLP_BIN),
            extract_timeout: Duration::from_secs(DEFAULT_EXTRACT_TIMEOUT_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

/// Process-wide settings, injected into the dispatcher and resolver.
#[derive(Debug, Clone)]
pub struct ClipclockConfig {
    pub extractor: ExtractorConfig,
    /// Maximum number of jobs allowed in `processing` at once.
    pub max_concurrent: u32,
    /// Rows per page on listing views.
    pub page_size: usize,
}

impl Default for ClipclockConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClipclockConfig {
    /// Read configuration from environment variables.
    ///
    /// - `CLIPCLOCK_YTDLP_BIN` (defaults to `yt-dlp`)
    /// - `CLIPCLOCK_EXTRACT_TIMEOUT_SECS` (defaults to 120)
    /// - `CLIPCLOCK_FETCH_TIMEOUT_SECS` (defaults to 30)
    /// - `CLIPCLOCK_MAX_CONCURRENT` (defaults to 3)
    /// - `CLIPCLOCK_PAGE_SIZE` (defaults to 50)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ytdlp_bin = lookup("CLIPCLOCK_YTDLP_BIN")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_YTDLP_BIN));

        let extract_timeout = positive(
            &lookup,
            "CLIPCLOCK_EXTRACT_TIMEOUT_SECS",
            DEFAULT_EXTRACT_TIMEOUT_SECS,
        )?;
        let fetch_timeout = positive(
            &lookup,
            "CLIPCLOCK_FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?;
        let max_concurrent = positive(
            &lookup,
            "CLIPCLOCK_MAX_CONCURRENT",
            DEFAULT_MAX_CONCURRENT as u64,
        )?;
        let page_size = positive(&lookup, "CLIPCLOCK_PAGE_SIZE", DEFAULT_PAGE_SIZE as u64)?;

        Ok(Self {
            extractor: ExtractorConfig {
                ytdlp_bin,
                extract_timeout: Duration::from_secs(extract_timeout),
                fetch_timeout: Duration::from_secs(fetch_timeout),
            },
            max_concurrent: u32::try_from(max_concurrent).map_err(|_| {
                AppError::ConfigError(format!(
                    "CLIPCLOCK_MAX_CONCURRENT '{max_concurrent}' is too large"
                ))
            })?,
            page_size: page_size as usize,
        })
    }

    pub fn with_max_concurrent(mut self, max: u32) -> Self {
        self.max_concurrent = max;
        self
    }

    pub fn with_ytdlp_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.extractor.ytdlp_bin = bin.into();
        self
    }
}

fn positive<F>(lookup: &F, key: &str, default: u64) -> Result<u64, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => {
            let parsed: u64 = raw.trim().parse().map_err(|_| {
                AppError::ConfigError(format!("Invalid {key} '{raw}': must be a positive integer"))
            })?;
            if parsed == 0 {
                return Err(AppError::ConfigError(format!("{key} must be at least 1")));
            }
            Ok(parsed)
        }
    }
}
