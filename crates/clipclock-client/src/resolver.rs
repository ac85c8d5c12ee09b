//! Maps a URL's host to the strategy that handles it.

use clipclock_core::config::ExtractorConfig;
use clipclock_core::error::AppError;
use clipclock_core::job::ExtractionResult;
use clipclock_core::traits::{CommandRunner, Extractor, ExtractorResolver, Fetcher};
use clipclock_core::util::{host_matches, host_of};

use crate::generic::GenericExtractor;
use crate::vimeo::VimeoExtractor;
use crate::youtube::YouTubeExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    YouTube,
    Vimeo,
}

/// Registered domains, checked in order. First match wins.
static REGISTRY: &[(&str, Site)] = &[
    ("youtube.com", Site::YouTube),
    ("youtu.be", Site::YouTube),
    ("vimeo.com", Site::Vimeo),
];

/// The strategy chosen for one URL.
#[derive(Clone)]
pub enum SiteExtractor<R: CommandRunner, F: Fetcher> {
    Generic(GenericExtractor<R>),
    YouTube(YouTubeExtractor<R>),
    Vimeo(VimeoExtractor<F>),
}

impl<R: CommandRunner, F: Fetcher> Extractor for SiteExtractor<R, F> {
    fn name(&self) -> &'static str {
        match self {
            SiteExtractor::Generic(e) => e.name(),
            SiteExtractor::YouTube(e) => e.name(),
            SiteExtractor::Vimeo(e) => e.name(),
        }
    }

    async fn extract(&self, url: &str) -> Result<ExtractionResult, AppError> {
        match self {
            SiteExtractor::Generic(e) => e.extract(url).await,
            SiteExtractor::YouTube(e) => e.extract(url).await,
            SiteExtractor::Vimeo(e) => e.extract(url).await,
        }
    }
}

/// Resolver over the static domain registry, falling back to the generic strategy.
#[derive(Clone)]
pub struct SiteResolver<R: CommandRunner, F: Fetcher> {
    runner: R,
    fetcher: F,
    config: ExtractorConfig,
}

impl<R: CommandRunner, F: Fetcher> SiteResolver<R, F> {
    pub fn new(runner: R, fetcher: F, config: ExtractorConfig) -> Self {
        Self {
            runner,
            fetcher,
            config,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    fn site_for(url: &str) -> Option<Site> {
        let host = host_of(url)?;
        REGISTRY
            .iter()
            .find(|(domain, _)| host_matches(&host, domain))
            .map(|(_, site)| *site)
    }
}

impl<R: CommandRunner, F: Fetcher> ExtractorResolver for SiteResolver<R, F> {
    type Extractor = SiteExtractor<R, F>;

    fn resolve(&self, url: &str) -> SiteExtractor<R, F> {
        let extractor = match Self::site_for(url) {
            Some(Site::YouTube) => {
                SiteExtractor::YouTube(YouTubeExtractor::new(self.runner.clone(), self.config.clone()))
            }
            Some(Site::Vimeo) => SiteExtractor::Vimeo(VimeoExtractor::new(self.fetcher.clone())),
            None => {
                SiteExtractor::Generic(GenericExtractor::new(self.runner.clone(), self.config.clone()))
            }
        };
        tracing::debug!(url, extractor = extractor.name(), "Resolved extractor");
        extractor
    }
}
