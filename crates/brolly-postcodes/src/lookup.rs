//! postcodes.io client.
//!
//! The service answers every lookup with a JSON body carrying its own
//! `status` field; 200 means the postcode exists.

use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LookupError;

/// Longitude/latitude of a postcode centroid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// The parts of a postcodes.io `result` we use
#[derive(Debug, Clone, Deserialize)]
pub struct PostcodeDetails {
    pub postcode: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl PostcodeDetails {
    /// Some postcodes (e.g. PO boxes) have no location
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.longitude, self.latitude) {
            (Some(longitude), Some(latitude)) => Some(Coordinates {
                longitude,
                latitude,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: u16,
    result: Option<PostcodeDetails>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostcodeLookup {
    client: Arc<Client>,
    base_url: String,
}

impl PostcodeLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client: Arc::new(client),
            base_url,
        })
    }

    /// Look a postcode up. `Ok(None)` means the service rejected it.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn lookup(&self, postcode: &str) -> Result<Option<PostcodeDetails>, LookupError> {
        let postcode = postcode.trim();
        if postcode.is_empty() {
            return Ok(None);
        }

        let url = format!(
            "{}/postcodes/{}",
            self.base_url,
            urlencoding::encode(postcode)
        );

        // Rejections come back as 404 with a JSON body, so the HTTP status
        // is not checked; the body's own status decides.
        let response = self.client.get(&url).send().await?;
        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        if body.status != 200 {
            tracing::debug!(
                "Postcode {} rejected with status {}: {}",
                postcode,
                body.status,
                body.error.as_deref().unwrap_or("no reason given")
            );
            return Ok(None);
        }

        body.result
            .map(Some)
            .ok_or_else(|| LookupError::Parse("status 200 without a result".to_string()))
    }

    /// Whether the service recognises `postcode`.
    pub async fn is_valid(&self, postcode: &str) -> Result<bool, LookupError> {
        Ok(self.lookup(postcode).await?.is_some())
    }

    /// Coordinates for `postcode`, or `None` if it is unknown or has no location.
    pub async fn resolve(&self, postcode: &str) -> Result<Option<Coordinates>, LookupError> {
        Ok(self
            .lookup(postcode)
            .await?
            .and_then(|details| details.coordinates()))
    }
}
