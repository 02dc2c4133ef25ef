//! Count source backed by the REST users/chats snapshot

use std::time::Duration;

use url::Url;

use crate::error::Result;
use crate::types::ServerSection;
use crate::types::options::RealtimeOptions;
use crate::types::sections::categorization_for;

use super::CountSource;
use super::categorize::UsersChatsSnapshot;

/// Fetches the full users/chats snapshot and counts one section from it
///
/// Every call re-fetches the snapshot. Any failure, including the request
/// timeout, yields a count of 0 so a flaky backend reads as "nothing new".
#[derive(Debug, Clone)]
pub struct HttpCountSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpCountSource {
    /// Create a count source for the configured REST base
    ///
    /// # Errors
    /// Returns error if the endpoint URL is invalid or the HTTP client cannot be built
    pub fn new(options: &RealtimeOptions) -> Result<Self> {
        Self::with_timeout(options.users_chats_url()?, options.count_fetch_timeout)
    }

    /// Create a count source for an explicit snapshot URL
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn with_timeout(url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// Fetch and decode one snapshot
    ///
    /// # Errors
    /// Returns error on timeout, transport failure, non-2xx status or bad body
    pub async fn fetch_snapshot(&self) -> Result<UsersChatsSnapshot> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<UsersChatsSnapshot>().await?)
    }
}

impl CountSource for HttpCountSource {
    async fn fetch_section_count(&self, section: &ServerSection) -> u64 {
        match self.fetch_snapshot().await {
            Ok(snapshot) => snapshot.count(&categorization_for(section)),
            Err(e) => {
                log::warn!("Failed to fetch chat count for section {section}: {e}");
                0
            }
        }
    }
}
