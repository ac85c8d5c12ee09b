pub mod fetcher;
pub mod generic;
pub mod resolver;
pub mod runner;
pub mod vimeo;
pub mod youtube;
mod ytdlp;

pub use fetcher::HttpFetcher;
pub use generic::GenericExtractor;
pub use resolver::{SiteExtractor, SiteResolver};
pub use runner::ProcessRunner;
pub use vimeo::VimeoExtractor;
pub use youtube::YouTubeExtractor;

/// Resolver wired to the real process runner and HTTP fetcher.
pub type DefaultResolver = SiteResolver<ProcessRunner, HttpFetcher>;
