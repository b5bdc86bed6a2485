//! Client-wide settings shared by every view.

use std::time::Duration;

use url::Url;

use crate::debounce::DEFAULT_DEBOUNCE;
use crate::error::Result;
use crate::feedback::DEFAULT_NOTICE_TTL;
use crate::listing::PAGE_SIZE;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base of every endpoint; always ends with `/`.
    pub api_base_url: Url,
    pub page_size: u32,
    pub search_debounce: Duration,
    pub notice_ttl: Duration,
}

impl ClientConfig {
    pub fn new(api_base_url: &str) -> Result<Self> {
        let mut url = Url::parse(api_base_url.trim())?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self {
            api_base_url: url,
            ..Self::default()
        })
    }

    /// Resolve an endpoint path such as `patients/` against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.api_base_url.join(path.trim_start_matches('/'))?)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            page_size: PAGE_SIZE,
            search_debounce: DEFAULT_DEBOUNCE,
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }
}
