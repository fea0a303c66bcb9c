//! CLI for the wikidl random article downloader.

mod download;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use wikidl_core::config;

use download::run_download;

/// Download random Wikipedia articles as printable HTML files.
#[derive(Debug, Parser)]
#[command(name = "wikidl")]
#[command(version)]
#[command(about = "Download random Wikipedia articles as printable HTML", long_about = None)]
pub struct Cli {
    /// Number of random articles to download.
    pub article_count: usize,

    /// Existing directory that receives one `<title>.html` file per article.
    pub output_dir: PathBuf,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        run_download(&cfg, cli.article_count, &cli.output_dir)
    }
}
