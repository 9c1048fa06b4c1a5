//! SourceForge project RSS source

use std::sync::Arc;

use tracing::debug;

use crate::version::error::CheckError;
use crate::version::extract::{extract_xml, first_group};
use crate::version::fetcher::Fetcher;

/// The newest file appears as the first item of the feed
const LATEST_LINK_XPATH: &str = "//item[1]/link";

/// Resolves versions from the download link of a project's newest file
pub struct SourceForgeRss {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
}

impl SourceForgeRss {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Feed URL, optionally narrowed to a folder of the file tree
    pub fn feed_url(&self, project: &str, path: Option<&str>) -> String {
        let mut url = format!("{}/projects/{}/rss", self.base_url, project);
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            url.push_str("?path=/");
            url.push_str(path.trim_start_matches('/'));
        }
        url
    }

    /// Latest file link of `project`, reduced through `regex` group 1 when given
    pub async fn latest_version(
        &self,
        project: &str,
        path: Option<&str>,
        regex: Option<&str>,
        user_agent: &str,
    ) -> Result<Option<String>, CheckError> {
        let url = self.feed_url(project, path);
        let body = self.fetcher.fetch_text(&url, user_agent).await?;

        let Some(link) = extract_xml(&body, LATEST_LINK_XPATH)? else {
            debug!("SourceForge feed for {} has no items", project);
            return Ok(None);
        };

        match regex {
            Some(pattern) => Ok(first_group(&link, pattern)?),
            None => Ok(Some(link)),
        }
    }
}
