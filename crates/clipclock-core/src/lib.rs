pub mod config;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod job_store;
pub mod poller;
pub mod traits;
pub mod util;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::{ClipclockConfig, ExtractorConfig};
pub use dispatcher::{
    Advance, DispatchEvent, DispatchReporter, Dispatcher, DispatcherConfig,
    TracingDispatchReporter,
};
pub use error::AppError;
pub use job::{CompletedExtraction, ExtractionResult, Job, JobCounts, JobStatus, ListQuery};
pub use job_store::JobStore;
pub use poller::{PollOptions, PollSummary};
pub use traits::{CommandOutput, CommandRunner, Extractor, ExtractorResolver, Fetcher};
pub use util::{domain_of, format_duration, host_matches, validate_submission};
