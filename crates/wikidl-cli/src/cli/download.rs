//! `wikidl <count> <dir>` – download a batch of random articles.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use wikidl_core::config::WikidlConfig;
use wikidl_core::dispatcher::{DispatchSettings, Dispatcher};
use wikidl_core::fetcher::Endpoints;
use wikidl_core::http_client::HttpClient;

pub fn run_download(cfg: &WikidlConfig, article_count: usize, output_dir: &Path) -> Result<()> {
    if !output_dir.is_dir() {
        // Not fatal: every task's write will fail and be logged.
        tracing::warn!("output dir {} does not exist", output_dir.display());
    }

    let client = Arc::new(HttpClient::new(cfg.client_settings()));
    let mut dispatcher = Dispatcher::new(client, Endpoints::default(), DispatchSettings::from(cfg));
    let summary = dispatcher.run(article_count, output_dir)?;

    if summary.timed_out {
        tracing::warn!(
            "{} article(s) finished after the await bound and are not in the summary",
            summary.unfinished
        );
    }
    Ok(())
}
