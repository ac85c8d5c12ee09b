use clipclock_core::error::AppError;
use clipclock_core::job::ExtractionResult;
use clipclock_core::traits::{Extractor, Fetcher};
use serde::Deserialize;
use url::Url;

const OEMBED_ENDPOINT: &str = "https://vimeo.com/api/oembed.json";
const SITE_TITLE: &str = "Vimeo";

/// Subset of the oEmbed response we read.
#[derive(Debug, Deserialize)]
struct OEmbed {
    duration: Option<f64>,
    title: Option<String>,
    provider_name: Option<String>,
}

/// Vimeo strategy: reads duration and title from the public oEmbed endpoint.
///
/// No external process is spawned.
#[derive(Clone)]
pub struct VimeoExtractor<F: Fetcher> {
    fetcher: F,
}

impl<F: Fetcher> VimeoExtractor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetcher> Extractor for VimeoExtractor<F> {
    fn name(&self) -> &'static str {
        "Vimeo (oEmbed)"
    }

    async fn extract(&self, url: &str) -> Result<ExtractionResult, AppError> {
        let endpoint = oembed_url(url)?;
        let body = self
            .fetcher
            .fetch(endpoint.as_str())
            .await
            .map_err(|e| AppError::extraction(format!("Vimeo lookup failed: {e}")))?;

        let oembed: OEmbed = serde_json::from_str(&body)
            .map_err(|e| AppError::extraction(format!("Invalid oEmbed response: {e}")))?;

        let duration = oembed
            .duration
            .filter(|d| d.is_finite())
            .map(|d| d.round() as i64)
            .filter(|d| *d > 0)
            .ok_or_else(|| AppError::extraction("oEmbed response has no usable duration"))?;

        let site = oembed
            .provider_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| SITE_TITLE.to_string());
        let mut result = ExtractionResult::new(duration).with_site_title(site);
        if let Some(title) = oembed.title.filter(|t| !t.trim().is_empty()) {
            result = result.with_video_title(title);
        }
        Ok(result)
    }
}

fn oembed_url(video_url: &str) -> Result<Url, AppError> {
    Url::parse_with_params(OEMBED_ENDPOINT, &[("url", video_url)])
        .map_err(|e| AppError::extraction(format!("Invalid oEmbed URL: {e}")))
}
