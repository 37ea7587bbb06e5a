//! GeocoderClient - OpenStreetMap Nominatim adapter
//!
//! Resolves free-text addresses to coordinates (and back). Unresolvable
//! addresses surface as `Error::Geocode`; transport failures propagate as
//! `Error::Http`. Nothing here retries - the caller decides.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// User-Agent sent with every Nominatim request (required by their usage policy)
const USER_AGENT: &str = "RefugeeManagementSystem/1.0";

/// A geocoded address
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedLocation {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub display_name: Option<String>,
}

/// Nominatim /search hit (lat/lon arrive as strings)
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

/// Nominatim /reverse response
#[derive(Debug, Deserialize)]
struct ReverseHit {
    display_name: Option<String>,
}

/// GeocoderClient instance
pub struct GeocoderClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeocoderClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Resolve an address to a coordinate
    pub async fn resolve(&self, address: &str) -> Result<ResolvedLocation> {
        let hits: Vec<SearchHit> = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| Error::Geocode(format!("address not found: {address}")))?;

        let latitude: f64 = hit
            .lat
            .parse()
            .map_err(|_| Error::Geocode(format!("unparseable latitude for '{address}'")))?;
        let longitude: f64 = hit
            .lon
            .parse()
            .map_err(|_| Error::Geocode(format!("unparseable longitude for '{address}'")))?;
        let coordinate = Coordinate::new(latitude, longitude).map_err(|_| {
            Error::Geocode(format!("out-of-range coordinates returned for '{address}'"))
        })?;

        Ok(ResolvedLocation {
            coordinate,
            display_name: hit.display_name,
        })
    }

    /// Resolve a coordinate back to a display address
    pub async fn reverse(&self, coordinate: Coordinate) -> Result<String> {
        let hit: ReverseHit = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("format", "json".to_string()),
            ])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        hit.display_name
            .ok_or_else(|| Error::Geocode("location not found".to_string()))
    }
}
