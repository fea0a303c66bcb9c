//! One unit of work: resolve a random title, fetch its printable page, save it.
//!
//! Errors stop at this boundary. They are logged and reduced to a
//! [`TaskOutcome`]; nothing is retried or propagated.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{DownloadError, Stage};
use crate::fetcher::ArticleFetcher;

const HTML_EXTENSION: &str = ".html";

/// An article written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArticle {
    pub title: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Saved(SavedArticle),
    Failed(Stage),
}

#[derive(Clone)]
pub struct DownloadTask {
    fetcher: Arc<ArticleFetcher>,
    output_dir: PathBuf,
}

impl DownloadTask {
    pub fn new(fetcher: Arc<ArticleFetcher>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
        }
    }

    /// Runs the task to completion on the current thread. Never fails.
    pub fn run(&self) -> TaskOutcome {
        match self.try_run() {
            Ok(saved) => {
                tracing::debug!(title = %saved.title, path = %saved.path.display(), "article saved");
                TaskOutcome::Saved(saved)
            }
            Err(err) => {
                let stage = err.stage();
                log_failure(err);
                TaskOutcome::Failed(stage)
            }
        }
    }

    fn try_run(&self) -> Result<SavedArticle, DownloadError> {
        let title = self.fetcher.resolve_random_title()?;
        println!("Downloading '{}' ...", title);
        let html = self.fetcher.fetch_printable_html(&title)?;
        let path = save_article(&self.output_dir, &title, &html)?;
        Ok(SavedArticle { title, path })
    }
}

/// Writes `html` to `<output_dir>/<title>.html`, creating or truncating the file.
/// The title is used as-is for the file name.
pub fn save_article(output_dir: &Path, title: &str, html: &str) -> Result<PathBuf, DownloadError> {
    let path = article_path(output_dir, title);
    fs::write(&path, html.as_bytes()).map_err(|source| DownloadError::Write {
        title: title.to_string(),
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn article_path(output_dir: &Path, title: &str) -> PathBuf {
    output_dir.join(format!("{}{}", title, HTML_EXTENSION))
}

fn log_failure(err: DownloadError) {
    let stage = err.stage();
    let err = anyhow::Error::new(err);
    match stage {
        Stage::Write => tracing::error!("cannot write article to file: {:#}", err),
        Stage::Resolve | Stage::Fetch => tracing::error!("download failed: {:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_path_appends_html_extension() {
        assert_eq!(
            article_path(Path::new("/tmp/out"), "Cat"),
            PathBuf::from("/tmp/out/Cat.html")
        );
        assert_eq!(
            article_path(Path::new("out"), "Caf%C3%A9_(band)"),
            PathBuf::from("out/Caf%C3%A9_(band).html")
        );
    }

    #[test]
    fn save_article_writes_utf8_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let html = "<html><body>Zürich – 東京</body></html>";
        let path = save_article(dir.path(), "Zurich", html).unwrap();
        assert_eq!(path, dir.path().join("Zurich.html"));
        assert_eq!(fs::read(&path).unwrap(), html.as_bytes());
    }

    #[test]
    fn save_article_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        save_article(dir.path(), "Cat", "<p>a much longer first version</p>").unwrap();
        let path = save_article(dir.path(), "Cat", "<p>v2</p>").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>v2</p>");
    }

    #[test]
    fn save_article_into_missing_dir_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = save_article(&missing, "Cat", "<p/>").unwrap_err();
        match err {
            DownloadError::Write { title, path, source } => {
                assert_eq!(title, "Cat");
                assert_eq!(path, missing.join("Cat.html"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Write, got {:?}", other),
        }
        assert!(!missing.exists());
    }
}
