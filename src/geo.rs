//! Country resolution for source IPs
//!
//! Wraps the ip-api.com JSON endpoint behind a small trait so the pipeline
//! can swap in a stub during tests or run fully offline.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::Result;

/// Sentinel country recorded when a lookup fails or returns nothing.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Default lookup endpoint; the IP is appended as a path segment.
pub const DEFAULT_GEO_ENDPOINT: &str = "http://ip-api.com/json";

/// Maps a source IP to a country name.
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn country_for(&self, ip: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct GeoPayload {
    country: Option<String>,
}

impl GeoPayload {
    /// Country name out of a lookup response. Failed lookups come back
    /// without a `country` field and map to the unknown sentinel.
    fn into_country(self) -> String {
        self.country
            .filter(|country| !country.is_empty())
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
    }
}

/// Production resolver backed by the ip-api.com HTTP service.
pub struct IpApiResolver {
    client: Client,
    endpoint: String,
}

impl IpApiResolver {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GeoResolver for IpApiResolver {
    async fn country_for(&self, ip: &str) -> Result<String> {
        let url = format!("{}/{}", self.endpoint, ip);
        debug!("Resolving country for {} via {}", ip, url);

        let payload: GeoPayload = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(payload.into_country())
    }
}

/// Resolver used with `--offline`; every IP maps to the unknown sentinel
/// without touching the network.
pub struct OfflineResolver;

#[async_trait]
impl GeoResolver for OfflineResolver {
    async fn country_for(&self, _ip: &str) -> Result<String> {
        Ok(UNKNOWN_COUNTRY.to_string())
    }
}
