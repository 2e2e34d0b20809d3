//! Copernicus Data Space client: OAuth client-credentials token + STAC search

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;

use super::catalog::{Mission, ProductDescriptor, SatelliteCatalog, TimeWindow};
use crate::config::ServiceConfig;
use crate::error::{Result, RiskError};
use crate::location::BoundingBox;

const SERVICE: &str = "copernicus";

/// Results requested per STAC search
const SEARCH_LIMIT: usize = 5;

/// Highest cloud cover accepted for multispectral products
const MAX_CLOUD_COVER: f64 = 30.0;

/// Tokens are dropped this long before the server says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

fn default_expires_in() -> u64 {
    300
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    features: Vec<StacItem>,
}

#[derive(Debug, Deserialize)]
struct StacItem {
    id: String,
    #[serde(default)]
    properties: StacProperties,
}

#[derive(Debug, Default, Deserialize)]
struct StacProperties {
    datetime: Option<DateTime<Utc>>,
    #[serde(rename = "eo:cloud_cover")]
    cloud_cover: Option<f64>,
    #[serde(rename = "sat:orbit_state")]
    orbit_state: Option<String>,
}

impl From<StacItem> for ProductDescriptor {
    fn from(item: StacItem) -> Self {
        ProductDescriptor {
            id: item.id,
            acquired_at: item.properties.datetime,
            cloud_cover: item.properties.cloud_cover,
            orbit_state: item.properties.orbit_state,
        }
    }
}

/// STAC request body for one mission
fn search_body(mission: Mission, bbox: &BoundingBox, window: &TimeWindow) -> serde_json::Value {
    let query = match mission {
        Mission::Sentinel1 => json!({
            "sar:product_type": { "eq": "GRD" },
            "sar:instrument_mode": { "eq": "IW" },
        }),
        Mission::Sentinel2 => json!({
            "eo:cloud_cover": { "lte": MAX_CLOUD_COVER },
            "productType": { "eq": "S2MSI2A" },
        }),
    };
    json!({
        "collections": [mission.collection()],
        "bbox": bbox.to_stac(),
        "datetime": window.to_stac_interval(),
        "limit": SEARCH_LIMIT,
        "query": query,
    })
}

/// Catalog backed by the Copernicus Data Space Ecosystem
#[derive(Debug)]
pub struct CopernicusCatalog {
    client: reqwest::Client,
    token_url: String,
    stac_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl CopernicusCatalog {
    /// `None` when the service config carries no credentials
    pub fn from_config(client: reqwest::Client, config: &ServiceConfig) -> Option<Self> {
        let (client_id, client_secret) = config.copernicus_credentials()?;
        Some(Self {
            client,
            token_url: config.copernicus_token_url.clone(),
            stac_url: config.copernicus_stac_url.clone(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token: Mutex::new(None),
        })
    }

    fn cached_token(&self, now: Instant) -> Option<String> {
        let slot = self.token.lock().ok()?;
        let fresh = slot.as_ref().filter(|t| now < t.refresh_at).map(|t| t.value.clone());
        fresh
    }

    fn store_token(&self, token: &TokenResponse, now: Instant) {
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(CachedToken {
                value: token.access_token.clone(),
                refresh_at: now + lifetime,
            });
        }
    }

    fn invalidate_token(&self) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = None;
        }
    }

    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token(Instant::now()) {
            return Ok(token);
        }

        info!("Authenticating with Copernicus Data Space");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let resp: TokenResponse = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| RiskError::upstream(SERVICE, e))?
            .error_for_status()
            .map_err(|e| RiskError::upstream(SERVICE, e))?
            .json()
            .await
            .map_err(|e| RiskError::upstream(SERVICE, e))?;

        self.store_token(&resp, Instant::now());
        Ok(resp.access_token)
    }
}

#[async_trait]
impl SatelliteCatalog for CopernicusCatalog {
    fn name(&self) -> &str {
        "Copernicus Data Space"
    }

    async fn search(&self, mission: Mission, bbox: &BoundingBox, window: &TimeWindow) -> Result<Vec<ProductDescriptor>> {
        let token = self.access_token().await?;
        let body = search_body(mission, bbox, window);
        debug!("STAC search {}: {}", mission.collection(), body);

        let resp = self
            .client
            .post(&self.stac_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RiskError::upstream(SERVICE, e))?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Copernicus rejected the access token, re-authenticating on next search");
            self.invalidate_token();
        }
        let resp: SearchResponse = resp
            .error_for_status()
            .map_err(|e| RiskError::upstream(SERVICE, e))?
            .json()
            .await
            .map_err(|e| RiskError::upstream(SERVICE, e))?;

        info!("Found {} {} products", resp.features.len(), mission.collection());
        Ok(resp.features.into_iter().map(ProductDescriptor::from).collect())
    }
}
