use super::types::{check_status, into_resolved_place, AutocompleteResponse, DetailsResponse};
use super::AddressResolver;
use crate::config::Config;
use crate::error::{Result, RoofError};
use async_trait::async_trait;
use reqwest::Client;
use roof_estimate_common::{AddressCandidate, ResolvedPlace, MIN_QUERY_CHARS};
use std::time::Duration;
use tracing::{debug, warn};

const AUTOCOMPLETE_URL: &str = "https://maps.googleapis.com/maps/api/place/autocomplete/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";
const DETAIL_FIELDS: &str = "address_components,geometry,formatted_address,types,name,place_id";

/// Places Web Service クライアント
#[derive(Debug, Clone)]
pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
    country: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: String, country: impl Into<String>, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(RoofError::MissingApiKey {
                provider: "Google Maps",
                env_var: crate::config::GOOGLE_MAPS_API_KEY_ENV,
            });
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            country: country.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.google_maps_api_key()?,
            config.country.clone(),
            config.timeout(),
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        failure: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!(error = %e, "places request failed");
                RoofError::Transport(format!("{}: {}", failure, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "places request returned non-success status");
            return Err(RoofError::Transport(format!("{}: HTTP {}", failure, status)));
        }

        response.json::<T>().await.map_err(|e| {
            RoofError::InvalidResponse(format!("{}: {}", failure, e.without_url()))
        })
    }
}

#[async_trait]
impl AddressResolver for GooglePlacesClient {
    async fn search(&self, text: &str) -> Result<Vec<AddressCandidate>> {
        if text.chars().count() < MIN_QUERY_CHARS {
            return Ok(Vec::new());
        }

        debug!(query = %text, "fetching address suggestions");
        let components = format!("country:{}", self.country);
        let body: AutocompleteResponse = self
            .get_json(
                AUTOCOMPLETE_URL,
                &[
                    ("input", text),
                    ("types", "address"),
                    ("components", components.as_str()),
                ],
                "Failed to fetch address suggestions",
            )
            .await?;

        check_status(&body.status, body.error_message.as_deref())?;
        debug!(count = body.predictions.len(), "address suggestions received");

        Ok(body
            .predictions
            .into_iter()
            .map(AddressCandidate::from)
            .collect())
    }

    async fn resolve_details(&self, candidate_id: &str) -> Result<ResolvedPlace> {
        debug!(place_id = %candidate_id, "fetching place details");
        let body: DetailsResponse = self
            .get_json(
                DETAILS_URL,
                &[("place_id", candidate_id), ("fields", DETAIL_FIELDS)],
                "Failed to fetch place details",
            )
            .await?;

        check_status(&body.status, body.error_message.as_deref())?;

        let result = body
            .result
            .ok_or_else(|| RoofError::NotFound("Place details not found".into()))?;
        into_resolved_place(result)
    }
}
