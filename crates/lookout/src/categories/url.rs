//! Frontend URL generation for the filter's target page.

use serde::Deserialize;

/// Builds links to the page that lists the filtered news
pub trait UrlBuilder: Send + Sync {
    /// Site-relative URL of the target page, with an optional path suffix
    fn frontend_url(&self, path_suffix: Option<&str>) -> String;

    /// Absolute URL of the unfiltered target page
    fn absolute_url(&self) -> String;
}

/// Target page as configured per filter
#[derive(Debug, Clone, Deserialize)]
pub struct TargetPage {
    /// Scheme and host, e.g. `https://example.org`
    #[serde(default)]
    pub base_url: String,

    /// Page path, e.g. `/news`
    #[serde(default = "default_path")]
    pub path: String,

    /// Appended after any suffix, e.g. `.html`
    #[serde(default)]
    pub url_suffix: String,
}

fn default_path() -> String {
    "/news".to_string()
}

impl Default for TargetPage {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            path: default_path(),
            url_suffix: String::new(),
        }
    }
}

impl UrlBuilder for TargetPage {
    fn frontend_url(&self, path_suffix: Option<&str>) -> String {
        let path = self.path.trim_end_matches('/');
        let url = format!("{}{}{}", path, path_suffix.unwrap_or(""), self.url_suffix);
        if url.is_empty() {
            "/".to_string()
        } else {
            url
        }
    }

    fn absolute_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.frontend_url(None)
        )
    }
}
