use crate::client::types::{AvailabilityQuery, Prediction, RawProperty};
use crate::geo::Coordinates;
use crate::models::Property;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// Source of the raw property catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every property the remote service knows about, unfiltered
    async fn fetch_properties(&self) -> Result<Vec<RawProperty>>;

    /// Get the name of the catalog source
    fn source_name(&self) -> &'static str;
}

/// Free-text location suggestions
#[async_trait]
pub trait PlaceSuggester: Send + Sync {
    async fn suggest(&self, input: &str) -> Result<Vec<Prediction>>;
}

/// Resolves a place id to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Fails with [`crate::Error::Geocode`] when no usable coordinates come back
    async fn geocode(&self, place_id: &str) -> Result<Coordinates>;
}

/// Date-range availability lookup
#[async_trait]
pub trait AvailabilityChecker: Send + Sync {
    /// Returns the ids of available listings.
    ///
    /// `candidates` are the properties the caller is about to intersect with;
    /// implementations may use them to narrow the lookup.
    async fn available(
        &self,
        query: &AvailabilityQuery,
        candidates: &[Property],
    ) -> Result<HashSet<String>>;
}
