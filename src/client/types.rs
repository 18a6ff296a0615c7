use crate::geo::Coordinates;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// A property as the catalog endpoint sends it.
///
/// Loosely typed on purpose: coordinates and prices arrive as strings or
/// numbers, identifiers as either. [`crate::Property::from_raw`] does the
/// coercion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProperty {
    #[serde(default)]
    pub listing_id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub latitude: Value,
    #[serde(default)]
    pub longitude: Value,
    #[serde(default)]
    pub price_min: Value,
    #[serde(default)]
    pub price_max: Value,
    #[serde(default)]
    pub guests: Value,
    #[serde(default)]
    pub bedrooms: Value,
    #[serde(default)]
    pub beds: Value,
    #[serde(default)]
    pub bathrooms: Value,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub pets_allowed: Value,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub average_rating: Value,
    #[serde(default)]
    pub is_live: Value,
    #[serde(default)]
    pub booking_active: Value,
}

/// `GET /api/webflow/properties`
#[derive(Debug, Deserialize)]
pub struct PropertiesResponse {
    #[serde(default)]
    pub properties: Vec<RawProperty>,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub description: String,
    pub place_id: String,
}

/// `GET /api/places/autocomplete`
#[derive(Debug, Deserialize)]
pub struct AutocompleteResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

/// `GET /api/places/details`
#[derive(Debug, Deserialize)]
pub struct PlaceDetailsResponse {
    pub result: Option<PlaceResult>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceResult {
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl PlaceDetailsResponse {
    /// The geocoded point, if the response carries a complete one.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let location = self.result.as_ref()?.geometry.as_ref()?.location.as_ref()?;
        match (location.lat, location.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(Coordinates::new(lat, lng))
            }
            _ => None,
        }
    }
}

/// `GET /api/search`
#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub available: Vec<Value>,
}

impl AvailabilityResponse {
    /// Listing ids normalized to strings, whether sent as numbers or strings.
    pub fn ids(&self) -> HashSet<String> {
        self.available
            .iter()
            .filter_map(|id| match id {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    }
}

/// Parameters of one availability lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityQuery {
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub guests: u32,
    pub center: Coordinates,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn details_without_geometry_has_no_coordinates() {
        let response: PlaceDetailsResponse =
            serde_json::from_value(json!({ "result": { "name": "Somewhere" } })).unwrap();
        assert!(response.coordinates().is_none());

        let response: PlaceDetailsResponse =
            serde_json::from_value(json!({ "status": "NOT_FOUND" })).unwrap();
        assert!(response.coordinates().is_none());
    }

    #[test]
    fn details_with_geometry() {
        let response: PlaceDetailsResponse = serde_json::from_value(json!({
            "result": { "geometry": { "location": { "lat": 42.65, "lng": -73.75 } } }
        }))
        .unwrap();
        assert_eq!(response.coordinates(), Some(Coordinates::new(42.65, -73.75)));
    }

    #[test]
    fn availability_ids_accept_strings_and_numbers() {
        let response: AvailabilityResponse =
            serde_json::from_value(json!({ "available": [101, "202", null] })).unwrap();
        let ids = response.ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("101"));
        assert!(ids.contains("202"));
    }

    #[test]
    fn properties_response_tolerates_missing_list() {
        let response: PropertiesResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.properties.is_empty());
    }
}
