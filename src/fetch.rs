//! The transport seam between the pipeline and the upstream text services.
//! [`HttpFetcher`] is the real implementation; tests substitute their own
//! [`Fetcher`].

use std::future::Future;
use url::Url;

/// A raw upstream response. Status handling is left to the caller.
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    /// Whether the HTTP status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests. Implementations must not retry.
pub trait Fetcher {
    fn get(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<Reply, reqwest::Error>> + Send;
}

/// A [`Fetcher`] backed by a [`reqwest::Client`]. No timeouts are set beyond
/// the client's defaults.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> HttpFetcher {
        HttpFetcher { client }
    }
}

impl Fetcher for HttpFetcher {
    fn get(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<Reply, reqwest::Error>> + Send {
        let request = self.client.get(url.clone());
        async move {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(Reply { status, body })
        }
    }
}
