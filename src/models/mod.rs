use crate::client::types::RawProperty;
use crate::geo::Coordinates;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Image shown on a card when the listing has none.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400x240?text=No+Image";

/// Location information for a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub coordinates: Option<Coordinates>,
}

/// Nightly price range. A zero side is kept; it is a real price for the
/// filter but not enough on its own to list a property.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    /// At least one side above zero.
    pub fn has_price(&self) -> bool {
        self.min.is_some_and(|n| n > 0.0) || self.max.is_some_and(|n| n > 0.0)
    }

    /// Sides above zero; a zero side prints like a missing one.
    pub fn shown(&self) -> (Option<f64>, Option<f64>) {
        (
            self.min.filter(|n| *n > 0.0),
            self.max.filter(|n| *n > 0.0),
        )
    }

    /// `$min-$max`, a single price, or "Price on request".
    pub fn display(&self) -> String {
        match self.shown() {
            (Some(min), Some(max)) if min != max => format!("${}-${}", min, max),
            (_, Some(max)) => format!("${}", max),
            (Some(min), None) => format!("${}", min),
            (None, None) => "Price on request".to_string(),
        }
    }
}

/// Sleeping capacity. Missing values never fail a minimum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Capacity {
    pub guests: Option<u32>,
    pub bedrooms: Option<u32>,
    pub beds: Option<u32>,
    pub bathrooms: Option<f32>,
}

/// Core property data model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: String,
    pub name: String,
    pub location: Location,
    pub price: PriceRange,
    pub capacity: Capacity,
    pub property_type: Option<String>,
    pub pets_allowed: bool,
    pub average_rating: Option<f64>,
    pub featured_image: Option<String>,
    pub is_live: bool,
    pub booking_active: bool,
}

impl Property {
    /// Coerces a wire record into a property.
    ///
    /// Returns `None` when the record has no usable listing id.
    pub fn from_raw(raw: RawProperty) -> Option<Property> {
        let Some(id) = identifier(&raw.listing_id) else {
            debug!("Dropping property without listingId: {:?}", raw.name);
            return None;
        };

        let coordinates = match (number(&raw.latitude), number(&raw.longitude)) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        };

        Some(Property {
            id,
            name: raw.name.unwrap_or_default(),
            location: Location {
                city: raw.city.unwrap_or_default(),
                state: raw.state.unwrap_or_default(),
                coordinates,
            },
            price: PriceRange {
                min: non_negative(&raw.price_min),
                max: non_negative(&raw.price_max),
            },
            capacity: Capacity {
                guests: count(&raw.guests),
                bedrooms: count(&raw.bedrooms),
                beds: count(&raw.beds),
                bathrooms: number(&raw.bathrooms)
                    .filter(|n| *n >= 0.0)
                    .map(|n| n as f32),
            },
            property_type: raw
                .property_type
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            pets_allowed: flag(&raw.pets_allowed),
            average_rating: positive(&raw.average_rating),
            featured_image: raw.featured_image.filter(|url| !url.trim().is_empty()),
            is_live: flag(&raw.is_live),
            booking_active: flag(&raw.booking_active),
        })
    }

    /// Live, accepting bookings and priced.
    pub fn is_eligible(&self) -> bool {
        self.is_live && self.booking_active && self.price.has_price()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.coordinates
    }

    /// "City, ST" line shown on cards and popups.
    pub fn place_label(&self) -> String {
        format!("{}, {}", self.location.city, self.location.state)
            .trim()
            .to_string()
    }

    pub fn type_label(&self) -> &str {
        self.property_type.as_deref().unwrap_or("House")
    }

    pub fn image_url(&self) -> &str {
        self.featured_image.as_deref().unwrap_or(PLACEHOLDER_IMAGE)
    }

    pub fn listing_path(&self) -> String {
        format!("/listings/{}", self.id)
    }
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn positive(value: &Value) -> Option<f64> {
    number(value).filter(|n| *n > 0.0)
}

fn non_negative(value: &Value) -> Option<f64> {
    number(value).filter(|n| *n >= 0.0)
}

fn count(value: &Value) -> Option<u32> {
    number(value).filter(|n| *n >= 0.0).map(|n| n.round() as u32)
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
