use crate::client::traits::{AvailabilityChecker, CatalogSource, Geocoder, PlaceSuggester};
use crate::client::types::{
    AutocompleteResponse, AvailabilityQuery, AvailabilityResponse, PlaceDetailsResponse,
    Prediction, PropertiesResponse, RawProperty,
};
use crate::config::Config;
use crate::geo::Coordinates;
use crate::models::Property;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// Shortest input worth sending to the autocomplete endpoint.
pub const MIN_SUGGEST_LEN: usize = 3;

/// HTTP client for the listings proxy
pub struct WorkerClient {
    client: Client,
    base: Url,
}

impl WorkerClient {
    /// Create a client against the configured base URL
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("stay-finder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| Error::Network(format!("failed to create HTTP client: {}", err)))?;

        Ok(Self {
            client,
            base: config.api_base.clone(),
        })
    }

    /// Joins path segments onto the base URL, keeping any base path prefix.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Validation(format!("{} cannot be used as a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn properties_url(&self) -> Result<Url> {
        self.endpoint(&["api", "webflow", "properties"])
    }

    pub(crate) fn autocomplete_url(&self, input: &str) -> Result<Url> {
        let mut url = self.endpoint(&["api", "places", "autocomplete"])?;
        url.query_pairs_mut().append_pair("input", input);
        Ok(url)
    }

    pub(crate) fn details_url(&self, place_id: &str) -> Result<Url> {
        let mut url = self.endpoint(&["api", "places", "details"])?;
        url.query_pairs_mut().append_pair("place_id", place_id);
        Ok(url)
    }

    pub(crate) fn availability_url(&self, query: &AvailabilityQuery) -> Result<Url> {
        let mut url = self.endpoint(&["api", "search"])?;
        url.query_pairs_mut()
            .append_pair("checkin", &query.checkin.format("%Y-%m-%d").to_string())
            .append_pair("checkout", &query.checkout.format("%Y-%m-%d").to_string())
            .append_pair("guests", &query.guests.to_string())
            .append_pair("lat", &query.center.lat.to_string())
            .append_pair("lng", &query.center.lng.to_string());
        Ok(url)
    }
}

#[async_trait]
impl CatalogSource for WorkerClient {
    async fn fetch_properties(&self) -> Result<Vec<RawProperty>> {
        let url = self.properties_url()?;
        info!("Fetching properties from {}", url);

        let response = self.client.get(url).send().await.map_err(|err| {
            if err.is_connect() {
                Error::Fetch(format!("catalog unreachable: {}", err))
            } else {
                Error::from(err)
            }
        })?;

        if !response.status().is_success() {
            warn!("Catalog returned status: {}", response.status());
            return Err(Error::Fetch(format!("API returned {}", response.status())));
        }

        let body: PropertiesResponse = response.json().await?;
        debug!("Total properties from API: {}", body.properties.len());
        Ok(body.properties)
    }

    fn source_name(&self) -> &'static str {
        "webflow"
    }
}

#[async_trait]
impl PlaceSuggester for WorkerClient {
    async fn suggest(&self, input: &str) -> Result<Vec<Prediction>> {
        let input = input.trim();
        if input.chars().count() < MIN_SUGGEST_LEN {
            return Ok(Vec::new());
        }

        let url = self.autocomplete_url(input)?;
        debug!("Fetching suggestions for {:?}", input);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            warn!("Autocomplete returned status: {}", response.status());
            return Err(Error::Fetch(format!(
                "autocomplete returned {}",
                response.status()
            )));
        }

        let body: AutocompleteResponse = response.json().await?;
        Ok(body.predictions)
    }
}

#[async_trait]
impl Geocoder for WorkerClient {
    async fn geocode(&self, place_id: &str) -> Result<Coordinates> {
        let url = self.details_url(place_id)?;
        debug!("Getting coordinates for place {}", place_id);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            warn!("Place details returned status: {}", response.status());
            return Err(Error::Geocode(place_id.to_string()));
        }

        let body: PlaceDetailsResponse = response
            .json()
            .await
            .map_err(|_| Error::Geocode(place_id.to_string()))?;

        let coordinates = body
            .coordinates()
            .ok_or_else(|| Error::Geocode(place_id.to_string()))?;
        info!("Location: {}, {}", coordinates.lat, coordinates.lng);
        Ok(coordinates)
    }
}

#[async_trait]
impl AvailabilityChecker for WorkerClient {
    async fn available(
        &self,
        query: &AvailabilityQuery,
        candidates: &[Property],
    ) -> Result<HashSet<String>> {
        let url = self.availability_url(query)?;
        debug!("Checking availability for {} properties", candidates.len());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| Error::Availability(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Availability(format!(
                "search returned {}",
                response.status()
            )));
        }

        let body: AvailabilityResponse = response
            .json()
            .await
            .map_err(|err| Error::Availability(err.to_string()))?;
        let ids = body.ids();
        debug!("Worker returned {} available properties", ids.len());
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client(base: &str) -> WorkerClient {
        let config = Config {
            api_base: Url::parse(base).unwrap(),
            ..Config::default()
        };
        WorkerClient::new(&config).unwrap()
    }

    #[test]
    fn builds_endpoints() {
        let client = client("https://proxy.example.dev");
        assert_eq!(
            client.properties_url().unwrap().as_str(),
            "https://proxy.example.dev/api/webflow/properties"
        );
        assert_eq!(
            client.details_url("ChIJ123").unwrap().as_str(),
            "https://proxy.example.dev/api/places/details?place_id=ChIJ123"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let client = client("https://example.dev/proxy/");
        assert_eq!(
            client.properties_url().unwrap().as_str(),
            "https://example.dev/proxy/api/webflow/properties"
        );
    }

    #[test]
    fn encodes_autocomplete_input() {
        let client = client("https://proxy.example.dev");
        assert_eq!(
            client.autocomplete_url("Saratoga Springs, NY").unwrap().as_str(),
            "https://proxy.example.dev/api/places/autocomplete?input=Saratoga+Springs%2C+NY"
        );
    }

    #[test]
    fn availability_query_string() {
        let client = client("https://proxy.example.dev");
        let query = AvailabilityQuery {
            checkin: NaiveDate::from_ymd_opt(2026, 7, 3).unwrap(),
            checkout: NaiveDate::from_ymd_opt(2026, 7, 6).unwrap(),
            guests: 4,
            center: Coordinates::new(43.08, -73.78),
        };
        assert_eq!(
            client.availability_url(&query).unwrap().as_str(),
            "https://proxy.example.dev/api/search?checkin=2026-07-03&checkout=2026-07-06&guests=4&lat=43.08&lng=-73.78"
        );
    }

    /// Answers every request on a local port with `status` and `body`.
    async fn serve(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}", addr)
    }

    /// Accepts connections and never answers.
    async fn silent() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    fn impatient(base: &str) -> WorkerClient {
        let config = Config {
            api_base: Url::parse(base).unwrap(),
            request_timeout: Duration::from_millis(300),
            ..Config::default()
        };
        WorkerClient::new(&config).unwrap()
    }

    fn query() -> AvailabilityQuery {
        AvailabilityQuery {
            checkin: NaiveDate::from_ymd_opt(2026, 7, 3).unwrap(),
            checkout: NaiveDate::from_ymd_opt(2026, 7, 6).unwrap(),
            guests: 2,
            center: Coordinates::new(42.65, -73.75),
        }
    }

    #[tokio::test]
    async fn catalog_error_status_is_a_fetch_error() {
        let client = client(&serve("502 Bad Gateway", "{}").await);
        let err = client.fetch_properties().await.unwrap_err();
        assert!(matches!(err, Error::Fetch(ref msg) if msg.contains("502")), "{:?}", err);
    }

    #[tokio::test]
    async fn catalog_body_is_decoded() {
        let client = client(
            &serve(
                "200 OK",
                r#"{"properties":[{"listingId":7,"name":"Cabin","isLive":true}]}"#,
            )
            .await,
        );
        let properties = client.fetch_properties().await.unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].name.as_deref(), Some("Cabin"));
    }

    #[tokio::test]
    async fn unreachable_catalog_is_a_fetch_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = client(&format!("http://{}", addr));
        let err = client.fetch_properties().await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn slow_catalog_is_a_network_error() {
        let client = impatient(&silent().await);
        let err = client.fetch_properties().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn slow_geocode_is_a_network_error() {
        let client = impatient(&silent().await);
        let err = client.geocode("ChIJ123").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn details_without_geometry_is_a_geocode_error() {
        let client = client(&serve("200 OK", r#"{"result":{"name":"Somewhere"}}"#).await);
        let err = client.geocode("ChIJ123").await.unwrap_err();
        assert!(matches!(err, Error::Geocode(ref id) if id == "ChIJ123"), "{:?}", err);
    }

    #[tokio::test]
    async fn details_error_status_is_a_geocode_error() {
        let client = client(&serve("404 Not Found", "{}").await);
        let err = client.geocode("ChIJ123").await.unwrap_err();
        assert!(matches!(err, Error::Geocode(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn details_geometry_gives_coordinates() {
        let client = client(
            &serve(
                "200 OK",
                r#"{"result":{"geometry":{"location":{"lat":43.08,"lng":-73.78}}}}"#,
            )
            .await,
        );
        let point = client.geocode("ChIJ123").await.unwrap();
        assert_eq!(point, Coordinates::new(43.08, -73.78));
    }

    #[tokio::test]
    async fn availability_error_status_is_an_availability_error() {
        let client = client(&serve("500 Internal Server Error", "{}").await);
        let err = client.available(&query(), &[]).await.unwrap_err();
        assert!(matches!(err, Error::Availability(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn availability_garbage_body_is_an_availability_error() {
        let client = client(&serve("200 OK", "<html>oops</html>").await);
        let err = client.available(&query(), &[]).await.unwrap_err();
        assert!(matches!(err, Error::Availability(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn short_input_skips_the_network() {
        // Unroutable base: any request would fail.
        let client = client("http://127.0.0.1:9");
        assert!(client.suggest("ny").await.unwrap().is_empty());
    }
}
