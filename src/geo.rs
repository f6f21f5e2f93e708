use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

pub const UNKNOWN_LOCATION: &str = "Unknown";

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl Address {
    fn label(self) -> Option<String> {
        [self.city, self.town, self.village, self.state, self.country]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
    }
}

/// Best-effort reverse geocoding; every failure collapses to [`UNKNOWN_LOCATION`].
#[derive(Debug, Clone)]
pub struct Geocoder {
    http: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub async fn locate(&self, lat: f64, lon: f64) -> String {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return UNKNOWN_LOCATION.to_string();
        }

        match self.reverse(lat, lon).await {
            Ok(Some(label)) => label,
            Ok(None) => UNKNOWN_LOCATION.to_string(),
            Err(err) => {
                warn!("reverse geocode failed: {err}");
                UNKNOWN_LOCATION.to_string()
            }
        }
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>, reqwest::Error> {
        let url = format!("{}/reverse", self.base_url);
        let response: ReverseResponse = self
            .http
            .get(url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.address.and_then(Address::label))
    }
}
