use clipclock_core::config::ExtractorConfig;
use clipclock_core::error::AppError;
use clipclock_core::job::ExtractionResult;
use clipclock_core::traits::{CommandRunner, Extractor};
use clipclock_core::util::host_matches;
use url::Url;

use crate::ytdlp::{non_empty, parse_seconds, print_fields};

const FIELDS: &[&str] = &["duration", "title"];
const SITE_TITLE: &str = "YouTube";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Path prefixes that carry the video id as the next segment.
const ID_PATH_PREFIXES: &[&str] = &["shorts", "embed", "live", "v"];

/// YouTube strategy: canonicalize the URL, then ask yt-dlp for duration and title.
#[derive(Clone)]
pub struct YouTubeExtractor<R: CommandRunner> {
    runner: R,
    config: ExtractorConfig,
}

impl<R: CommandRunner> YouTubeExtractor<R> {
    pub fn new(runner: R, config: ExtractorConfig) -> Self {
        Self { runner, config }
    }
}

impl<R: CommandRunner> Extractor for YouTubeExtractor<R> {
    fn name(&self) -> &'static str {
        "YouTube"
    }

    async fn extract(&self, url: &str) -> Result<ExtractionResult, AppError> {
        let url = normalize_url(url);
        let mut lines = print_fields(&self.runner, &self.config, &url, FIELDS)
            .await?
            .into_iter();
        let raw_duration = lines.next().unwrap_or_default();
        let title = lines.next().unwrap_or_default();

        let duration = parse_seconds(&raw_duration)
            .filter(|d| *d > 0)
            .ok_or_else(|| {
                AppError::extraction(format!(
                    "Could not parse duration from yt-dlp output: '{raw_duration}'"
                ))
            })?;

        let mut result = ExtractionResult::new(duration).with_site_title(SITE_TITLE);
        if let Some(title) = non_empty(title) {
            result = result.with_video_title(title);
        }
        Ok(result)
    }
}

/// Rewrite short links and alternate paths to `https://www.youtube.com/watch?v=<id>`.
///
/// Handles `youtu.be/<id>` and `youtube.com/{shorts,embed,live,v}/<id>`.
/// Anything else, including URLs already in `watch?v=` form, is returned as-is.
pub fn normalize_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return url.to_string();
    };
    let mut segments = parsed.path_segments().into_iter().flatten();

    let id = if host_matches(host, "youtu.be") {
        segments.next()
    } else if host_matches(host, "youtube.com") {
        match segments.next() {
            Some(prefix) if ID_PATH_PREFIXES.contains(&prefix) => segments.next(),
            _ => None,
        }
    } else {
        None
    };

    match id.filter(|id| is_video_id(id)) {
        Some(id) => format!("{WATCH_URL}{id}"),
        None => url.to_string(),
    }
}

fn is_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
