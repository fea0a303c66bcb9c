//! Dispatcher: fans a batch of download tasks out over the worker pool.
//!
//! Lifecycle: `Started → Submitting → AwaitingCompletion → Closing → Done`.
//! The shared HTTP client is closed on every path out, including early
//! returns, by a drop guard. A run does not return while any submitted task
//! is still running or queued: once the await bound passes the client is
//! closed and the remaining workers are joined without being interrupted.

mod summary;

pub use summary::RunSummary;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::WikidlConfig;
use crate::fetcher::{ArticleFetcher, Endpoints};
use crate::http_client::HttpClient;
use crate::pool::{PoolError, WorkerPool};
use crate::task::{DownloadTask, TaskOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Started,
    Submitting,
    AwaitingCompletion,
    Closing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Worker threads in the pool.
    pub workers: usize,
    /// Bound on the wait that feeds the summary. Reaching it cancels nothing;
    /// stragglers are joined after the client is closed.
    pub await_timeout: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            workers: 10,
            await_timeout: Duration::from_secs(600),
        }
    }
}

impl From<&WikidlConfig> for DispatchSettings {
    fn from(cfg: &WikidlConfig) -> Self {
        Self {
            workers: cfg.max_workers,
            await_timeout: cfg.await_timeout(),
        }
    }
}

/// Closes the shared client when dropped.
struct ClientGuard<'a> {
    client: &'a HttpClient,
}

impl Drop for ClientGuard<'_> {
    fn drop(&mut self) {
        close_client_safely(self.client);
    }
}

pub struct Dispatcher {
    client: Arc<HttpClient>,
    endpoints: Endpoints,
    settings: DispatchSettings,
    state: DispatchState,
}

impl Dispatcher {
    pub fn new(client: Arc<HttpClient>, endpoints: Endpoints, settings: DispatchSettings) -> Self {
        Self {
            client,
            endpoints,
            settings,
            state: DispatchState::Started,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Downloads `article_count` random articles into `output_dir`.
    ///
    /// Task failures are logged by the tasks and counted in the summary; they
    /// never fail the run. The only error is failing to start the worker pool.
    /// Tasks still running when the await bound passes are left to finish and
    /// joined before returning, so the caller may exit the process right after.
    pub fn run(&mut self, article_count: usize, output_dir: &Path) -> Result<RunSummary, PoolError> {
        let client = Arc::clone(&self.client);
        let guard = ClientGuard { client: &client };

        let fetcher = Arc::new(ArticleFetcher::new(
            Arc::clone(&client),
            self.endpoints.clone(),
        ));
        let task = DownloadTask::new(fetcher, output_dir);
        let mut pool: WorkerPool<TaskOutcome> = WorkerPool::new(self.settings.workers)?;

        self.transition(DispatchState::Submitting);
        for _ in 0..article_count {
            let task = task.clone();
            pool.submit(move || task.run())?;
        }
        let submitted = pool.submitted();
        tracing::info!(
            "submitted {} download task(s) to {} worker(s), output dir {}",
            submitted,
            pool.capacity(),
            output_dir.display()
        );

        self.transition(DispatchState::AwaitingCompletion);
        let mut termination = pool.await_termination(self.settings.await_timeout);
        let detached = std::mem::take(&mut termination.detached);
        if termination.timed_out {
            tracing::warn!(
                "tasks did not finish within {:?}; closing anyway",
                self.settings.await_timeout
            );
        }
        let summary = RunSummary::from_termination(submitted, termination);

        self.transition(DispatchState::Closing);
        drop(guard);
        if !detached.is_empty() {
            tracing::info!(
                "waiting for {} worker(s) to finish their remaining downloads",
                detached.len()
            );
            detached.join();
        }
        self.transition(DispatchState::Done);

        tracing::info!("run finished: {}", summary);
        Ok(summary)
    }

    fn transition(&mut self, next: DispatchState) {
        tracing::debug!("dispatcher {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn close_client_safely(client: &HttpClient) {
    match client.close() {
        Ok(released) => tracing::debug!("closed HTTP client, released {} idle handle(s)", released),
        Err(e) => tracing::error!("{}", e),
    }
}
