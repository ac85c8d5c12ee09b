use std::future::Future;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::error::AppError;
use crate::job::ExtractionResult;

/// Exit code reported for a process killed at its deadline (matches coreutils `timeout`).
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Captured result of one external process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code. `-1` when terminated by a signal,
    /// [`TIMEOUT_EXIT_CODE`] when killed at the deadline.
    pub exit_code: i32,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Runs an external executable under a hard wall-clock timeout.
///
/// Timeouts and non-zero exits are reported through [`CommandOutput`], not as
/// errors. Only a failure to start the process at all is an `Err`
/// ([`AppError::SpawnError`]).
pub trait CommandRunner: Send + Sync + Clone {
    fn run(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> impl Future<Output = Result<CommandOutput, AppError>> + Send;
}

/// Fetches a document body from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// One duration-extraction strategy.
pub trait Extractor: Send + Sync {
    /// Human-readable strategy name, recorded as `extractor_used`.
    fn name(&self) -> &'static str;

    /// Turn a URL into a duration and optional titles.
    fn extract(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<ExtractionResult, AppError>> + Send;
}

/// Picks the strategy for a URL. Never fails: unknown hosts get a generic fallback.
pub trait ExtractorResolver: Send + Sync + Clone {
    type Extractor: Extractor;

    fn resolve(&self, url: &str) -> Self::Extractor;
}
