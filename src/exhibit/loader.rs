//! Exhibit loading.
//!
//! An exhibit is either handed over already parsed, read from a local JSON
//! file, or fetched over HTTP. Failures surface as [`ExhibitError`] before
//! any viewer is constructed.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};
use url::Url;

use crate::error::ExhibitError;

use super::model::Exhibit;

/// Where an exhibit comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ExhibitSource {
    /// An already-parsed exhibit
    Resolved(Exhibit),

    /// A local JSON file
    Path(PathBuf),

    /// An `http` or `https` URL
    Url(Url),
}

impl ExhibitSource {
    /// Interpret a command-line argument as a URL when it has an `http(s)`
    /// scheme, and as a file path otherwise.
    pub fn parse(value: &str) -> Self {
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => ExhibitSource::Url(url),
            _ => ExhibitSource::Path(PathBuf::from(value)),
        }
    }
}

/// Fetches exhibit documents from remote locations.
#[async_trait]
pub trait ExhibitFetcher: Send + Sync {
    /// Fetch the raw body at `url`.
    async fn fetch(&self, url: &Url) -> Result<Bytes, ExhibitError>;
}

/// [`ExhibitFetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExhibitFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, ExhibitError> {
        let fetch_error = |e: reqwest::Error| ExhibitError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(fetch_error)?
            .error_for_status()
            .map_err(fetch_error)?;

        response.bytes().await.map_err(fetch_error)
    }
}

/// Resolve `source` into a parsed exhibit.
pub async fn load_exhibit(
    source: ExhibitSource,
    fetcher: &dyn ExhibitFetcher,
) -> Result<Exhibit, ExhibitError> {
    let exhibit = match source {
        ExhibitSource::Resolved(exhibit) => exhibit,
        ExhibitSource::Path(path) => {
            debug!("Reading exhibit from {}", path.display());
            let data = tokio::fs::read(&path)
                .await
                .map_err(|e| ExhibitError::Io(format!("{}: {}", path.display(), e)))?;
            Exhibit::from_slice(&data)?
        }
        ExhibitSource::Url(url) => {
            debug!("Fetching exhibit from {}", url);
            let data = fetcher.fetch(&url).await?;
            Exhibit::from_slice(&data)?
        }
    };

    info!(
        name = %exhibit.name,
        images = exhibit.images.len(),
        masks = exhibit.masks.len(),
        "Loaded exhibit"
    );
    Ok(exhibit)
}
