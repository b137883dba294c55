use crate::comic::Comic;
use crate::error::{FeedError, Result};
use std::time::Duration;

pub const API_BASE: &str = "https://xkcd.com";

pub struct XkcdClient {
    client: reqwest::Client,
    base: String,
}

impl XkcdClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn latest_url(&self) -> String {
        format!("{}/info.0.json", self.base)
    }

    fn comic_url(&self, id: u32) -> String {
        format!("{}/{}/info.0.json", self.base, id)
    }

    pub async fn fetch_latest(&self) -> Result<Comic> {
        self.get(self.latest_url()).await
    }

    pub async fn fetch_by_id(&self, id: u32) -> Result<Comic> {
        self.get(self.comic_url(id)).await
    }

    /// Fetch several comics concurrently. Order of the result is unspecified.
    pub async fn fetch_many(&self, ids: &[u32]) -> Result<Vec<Comic>> {
        futures::future::join_all(ids.iter().map(|&id| self.fetch_by_id(id)))
            .await
            .into_iter()
            .collect()
    }

    async fn get(&self, url: String) -> Result<Comic> {
        tracing::debug!("GET {}", url);
        let res = self.client.get(&url).send().await?;

        if !res.status().is_success() {
            return Err(FeedError::Status {
                status: res.status().as_u16(),
                url,
            });
        }

        let body = res.text().await?;
        decode(&body)
    }
}

fn decode(body: &str) -> Result<Comic> {
    Ok(serde_json::from_str(body)?)
}
