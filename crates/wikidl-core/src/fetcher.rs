//! Article fetcher: resolves random article titles and downloads printable pages.

use std::sync::Arc;

use crate::error::DownloadError;
use crate::http_client::HttpClient;

const RANDOM_ARTICLE_URL: &str = "https://en.wikipedia.org/wiki/Special:Random";
const ARTICLE_BASE_URL: &str = "https://en.wikipedia.org/w/index.php";
const PRINTABLE_PARAM: &str = "printable=yes";

/// The two fixed endpoints the fetcher talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Answers with a redirect whose `Location` ends in `/<title>`.
    pub random_article_url: String,
    /// Serves `?title=<title>&printable=yes`.
    pub article_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            random_article_url: RANDOM_ARTICLE_URL.to_string(),
            article_base_url: ARTICLE_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Same paths as Wikipedia, rooted at another origin (e.g. `http://127.0.0.1:8080`).
    pub fn with_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            random_article_url: format!("{}/wiki/Special:Random", origin),
            article_base_url: format!("{}/w/index.php", origin),
        }
    }
}

pub struct ArticleFetcher {
    client: Arc<HttpClient>,
    endpoints: Endpoints,
}

impl ArticleFetcher {
    pub fn new(client: Arc<HttpClient>, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    /// Asks the random-article endpoint for a redirect and returns the title it points at.
    ///
    /// The status code is ignored; only the `Location` header matters.
    pub fn resolve_random_title(&self) -> Result<String, DownloadError> {
        let response = self
            .client
            .get(&self.endpoints.random_article_url)
            .map_err(DownloadError::Resolution)?;
        let location = response
            .header("Location")
            .ok_or(DownloadError::MissingLocation)?;
        Ok(extract_title(location).to_string())
    }

    /// Downloads the printable rendering of `title` and decodes it as UTF-8.
    ///
    /// Non-2xx bodies are returned like any other body.
    pub fn fetch_printable_html(&self, title: &str) -> Result<String, DownloadError> {
        let url = self.printable_article_url(title);
        let response = self.client.get(&url).map_err(|source| DownloadError::Fetch {
            title: title.to_string(),
            source,
        })?;
        if !(200..300).contains(&response.status) {
            tracing::debug!(title, status = response.status, "printable page returned non-2xx");
        }
        Ok(response.into_text())
    }

    /// `<base>?title=<title>&printable=yes`. The title is not percent-encoded.
    pub fn printable_article_url(&self, title: &str) -> String {
        format!(
            "{}?title={}&{}",
            self.endpoints.article_base_url, title, PRINTABLE_PARAM
        )
    }
}

/// Everything after the last `/` of a redirect target (the whole value if it has none).
pub fn extract_title(location: &str) -> &str {
    match location.rfind('/') {
        Some(idx) => &location[idx + 1..],
        None => location,
    }
}
