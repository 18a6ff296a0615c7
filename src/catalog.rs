use crate::client::{CatalogSource, RawProperty};
use crate::models::Property;
use crate::Result;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Price bounds used when the catalog has no priced properties.
pub const EMPTY_PRICE_BOUNDS: (f64, f64) = (0.0, 1000.0);

/// Eligible properties for the session, in remote order.
#[derive(Debug, Clone, Default)]
pub struct PropertyCatalog {
    properties: Vec<Property>,
}

impl PropertyCatalog {
    /// Keeps only eligible properties; order is preserved.
    pub fn new(properties: impl IntoIterator<Item = Property>) -> Self {
        Self {
            properties: properties
                .into_iter()
                .filter(Property::is_eligible)
                .collect(),
        }
    }

    pub fn from_raw(raw: Vec<RawProperty>) -> Self {
        Self::new(raw.into_iter().filter_map(Property::from_raw))
    }

    /// Fetches and ingests the remote catalog.
    pub async fn fetch(source: &dyn CatalogSource) -> Result<Self> {
        let raw = source.fetch_properties().await?;
        let total = raw.len();
        let catalog = Self::from_raw(raw);
        info!(
            "Fetched {} live properties with booking active ({} from {})",
            catalog.len(),
            total,
            source.source_name()
        );
        for (state, count) in catalog.count_by_state() {
            debug!("   {}: {} properties", state, count);
        }
        Ok(catalog)
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// `(floor(min positive priceMin), ceil(max priceMax))`.
    pub fn price_bounds(&self) -> (f64, f64) {
        if self.properties.is_empty() {
            return EMPTY_PRICE_BOUNDS;
        }
        let lo = self
            .properties
            .iter()
            .filter_map(|p| p.price.min)
            .filter(|min| *min > 0.0)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))));
        let hi = self
            .properties
            .iter()
            .filter_map(|p| p.price.max)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
        (
            lo.map_or(EMPTY_PRICE_BOUNDS.0, f64::floor),
            hi.map_or(EMPTY_PRICE_BOUNDS.1, f64::ceil),
        )
    }

    /// Distinct property types in first-seen order.
    pub fn property_types(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.properties
            .iter()
            .filter_map(|p| p.property_type.as_ref())
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect()
    }

    pub fn count_by_state(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for property in &self.properties {
            let state = if property.location.state.is_empty() {
                "Unknown".to_string()
            } else {
                property.location.state.clone()
            };
            *counts.entry(state).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geo::Coordinates;
    use crate::models::{Capacity, Location, PriceRange};
    use async_trait::async_trait;
    use serde_json::json;

    /// Eligible property with sensible defaults for tests across the crate.
    pub(crate) fn property(id: &str) -> Property {
        Property {
            id: id.to_string(),
            name: format!("Property {}", id),
            location: Location {
                city: "Albany".to_string(),
                state: "NY".to_string(),
                coordinates: Some(Coordinates::new(42.65, -73.75)),
            },
            price: PriceRange {
                min: Some(100.0),
                max: Some(150.0),
            },
            capacity: Capacity {
                guests: Some(2),
                bedrooms: Some(1),
                beds: Some(1),
                bathrooms: Some(1.0),
            },
            property_type: Some("House".to_string()),
            pets_allowed: false,
            average_rating: None,
            featured_image: None,
            is_live: true,
            booking_active: true,
        }
    }

    struct StaticSource(serde_json::Value);

    #[async_trait]
    impl CatalogSource for StaticSource {
        async fn fetch_properties(&self) -> Result<Vec<RawProperty>> {
            Ok(serde_json::from_value(self.0.clone())?)
        }

        fn source_name(&self) -> &'static str {
            "static"
        }
    }

    #[test]
    fn only_eligible_properties_are_kept() {
        let mut not_live = property("2");
        not_live.is_live = false;
        let mut not_booking = property("3");
        not_booking.booking_active = false;
        let mut unpriced = property("4");
        unpriced.price = PriceRange::default();
        let mut max_only = property("5");
        max_only.price.min = None;

        let catalog =
            PropertyCatalog::new(vec![property("1"), not_live, not_booking, unpriced, max_only]);
        let ids: Vec<_> = catalog.properties().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "5"]);
        assert!(catalog.properties().iter().all(Property::is_eligible));
    }

    #[test]
    fn price_bounds_floor_and_ceil() {
        let mut a = property("a");
        a.price = PriceRange {
            min: Some(89.5),
            max: Some(120.0),
        };
        let mut b = property("b");
        b.price = PriceRange {
            min: None,
            max: Some(310.2),
        };
        let mut c = property("c");
        c.price.min = Some(0.0);
        let catalog = PropertyCatalog::new(vec![a, b, c]);
        assert_eq!(catalog.price_bounds(), (89.0, 311.0));
        assert_eq!(PropertyCatalog::default().price_bounds(), (0.0, 1000.0));
    }

    #[test]
    fn property_types_in_first_seen_order() {
        let mut cabin = property("2");
        cabin.property_type = Some("Cabin".into());
        let mut untyped = property("3");
        untyped.property_type = None;
        let catalog = PropertyCatalog::new(vec![property("1"), cabin, untyped, property("4")]);
        assert_eq!(catalog.property_types(), ["House", "Cabin"]);
    }

    #[test]
    fn counts_by_state() {
        let mut vermont = property("2");
        vermont.location.state = "VT".into();
        let mut unknown = property("3");
        unknown.location.state = String::new();
        let catalog = PropertyCatalog::new(vec![property("1"), vermont, unknown, property("4")]);
        let counts = catalog.count_by_state();
        assert_eq!(counts["NY"], 2);
        assert_eq!(counts["VT"], 1);
        assert_eq!(counts["Unknown"], 1);
    }

    #[tokio::test]
    async fn fetch_ingests_and_filters() {
        let source = StaticSource(json!([
            { "listingId": 1, "isLive": true, "bookingActive": true, "priceMin": 90, "priceMax": 120 },
            { "listingId": 2, "isLive": false, "bookingActive": true, "priceMin": 90 },
            { "listingId": 3, "isLive": true, "bookingActive": true, "priceMin": 0, "priceMax": 0 },
            { "name": "no id", "isLive": true, "bookingActive": true, "priceMin": 50 }
        ]));
        let catalog = PropertyCatalog::fetch(&source).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("1").is_some());
    }
}
