use clipclock_core::config::ExtractorConfig;
use clipclock_core::error::AppError;
use clipclock_core::job::ExtractionResult;
use clipclock_core::traits::{CommandRunner, Extractor};

use crate::ytdlp::{non_empty, parse_seconds, print_fields};

const FIELDS: &[&str] = &["duration", "title", "webpage_url_domain"];
const UNKNOWN_SITE: &str = "Unknown";

/// Fallback strategy: ask yt-dlp directly for duration, title and source site.
#[derive(Clone)]
pub struct GenericExtractor<R: CommandRunner> {
    runner: R,
    config: ExtractorConfig,
}

impl<R: CommandRunner> GenericExtractor<R> {
    pub fn new(runner: R, config: ExtractorConfig) -> Self {
        Self { runner, config }
    }
}

impl<R: CommandRunner> Extractor for GenericExtractor<R> {
    fn name(&self) -> &'static str {
        "Generic (yt-dlp)"
    }

    async fn extract(&self, url: &str) -> Result<ExtractionResult, AppError> {
        let mut lines = print_fields(&self.runner, &self.config, url, FIELDS)
            .await?
            .into_iter();
        let raw_duration = lines.next().unwrap_or_default();
        let title = lines.next().unwrap_or_default();
        let site = lines.next().unwrap_or_default();

        let duration = parse_seconds(&raw_duration)
            .filter(|d| *d > 0)
            .ok_or_else(|| AppError::extraction("Could not extract video duration from this page"))?;

        tracing::debug!(url, duration, "Generic extraction succeeded");

        let site = non_empty(site).unwrap_or_else(|| UNKNOWN_SITE.to_string());
        let mut result = ExtractionResult::new(duration).with_site_title(site);
        if let Some(title) = non_empty(title) {
            result = result.with_video_title(title);
        }
        Ok(result)
    }
}
