use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::{Advance, DispatchReporter, Dispatcher};
use crate::job_store::JobStore;
use crate::traits::ExtractorResolver;

/// How a polling loop drives [`Dispatcher::advance`].
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Sleep between calls when the queue is idle or at the cap.
    pub interval: Duration,
    /// Stop on the first idle result instead of waiting for new work.
    pub until_idle: bool,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            until_idle: false,
        }
    }
}

/// Totals from one polling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    pub completed: u64,
    pub failed: u64,
}

impl<S, R> Dispatcher<S, R>
where
    S: JobStore,
    R: ExtractorResolver,
{
    /// Call [`advance`](Self::advance) until cancelled.
    ///
    /// Processed jobs are followed immediately by the next call. Idle and
    /// waiting results sleep for `options.interval`; storage errors are
    /// logged and back off for twice that.
    pub async fn run<DR: DispatchReporter>(
        &self,
        cancel_token: CancellationToken,
        options: PollOptions,
        reporter: &DR,
    ) -> PollSummary {
        let mut summary = PollSummary::default();

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            let pause = match self.advance(reporter).await {
                Ok(Advance::Completed { .. }) => {
                    summary.completed += 1;
                    continue;
                }
                Ok(Advance::Failed { .. }) => {
                    summary.failed += 1;
                    continue;
                }
                Ok(Advance::Idle) if options.until_idle => break,
                Ok(Advance::Idle | Advance::Waiting) => options.interval,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to advance the queue");
                    options.interval * 2
                }
            };

            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                () = cancel_token.cancelled() => break,
            }
        }

        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            "Polling stopped"
        );
        summary
    }
}
