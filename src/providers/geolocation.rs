// Geolocation lookup (ip-api.com JSON format).
//
// This is the dedicated source of coordinates for the location history.
// The free endpoint needs no key; failures come back as HTTP 200 with
// `"status": "fail"` and a `message`, which we treat as a malformed answer.

use std::net::IpAddr;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::models::GeoLocation;
use super::traits::Provider;
use crate::error::ProviderError;

pub struct GeoIpClient {
    client: Client,
    base_url: String,
}

impl GeoIpClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: super::normalize_base_url(base_url),
        }
    }
}

#[async_trait]
impl Provider for GeoIpClient {
    type Info = GeoLocation;

    fn name(&self) -> &'static str {
        "geolocation"
    }

    async fn fetch(&self, ip: IpAddr) -> Result<GeoLocation, ProviderError> {
        let url = format!("{}/json/{}", self.base_url, ip);
        let request = self
            .client
            .get(&url)
            .query(&[("fields", "status,message,country,city,lat,lon")]);

        let response: GeoResponse = super::get_json(request).await?;
        location_from_response(response)
    }
}

/// Map a geolocation response; anything but a successful fix is an error.
pub fn location_from_response(response: GeoResponse) -> Result<GeoLocation, ProviderError> {
    if response.status != "success" {
        return Err(ProviderError::Malformed(format!(
            "geolocation status {:?}: {}",
            response.status,
            response.message.as_deref().unwrap_or("no message")
        )));
    }

    match (response.lat, response.lon) {
        (Some(latitude), Some(longitude)) => Ok(GeoLocation {
            country: response.country.unwrap_or_else(|| "Unknown".to_string()),
            city: response.city.unwrap_or_else(|| "Unknown".to_string()),
            latitude,
            longitude,
        }),
        _ => Err(ProviderError::Malformed(
            "geolocation response without coordinates".to_string(),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct GeoResponse {
    pub status: String,
    pub message: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}
