//! User-selected constraints and the predicate that applies them.

use crate::catalog::PropertyCatalog;
use crate::geo::Bounds;
use crate::models::Property;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Smallest gap the two price handles keep between each other.
pub const PRICE_GAP: f64 = 10.0;

/// Nightly price window. A property passes only if its own range fits inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBounds {
    pub lo: f64,
    pub hi: f64,
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self {
            lo: 0.0,
            hi: f64::INFINITY,
        }
    }
}

/// Which room counter a control adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Room {
    Bedrooms,
    Beds,
    Bathrooms,
}

/// The filter panel's state. Zero minimums and empty sets mean "Any".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub price: PriceBounds,
    pub min_guests: u32,
    pub min_bedrooms: u32,
    pub min_beds: u32,
    pub min_bathrooms: u32,
    pub property_types: BTreeSet<String>,
    pub pets_required: bool,
    pub viewport: Option<Bounds>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            price: PriceBounds::default(),
            min_guests: 1,
            min_bedrooms: 0,
            min_beds: 0,
            min_bathrooms: 0,
            property_types: BTreeSet::new(),
            pets_required: false,
            viewport: None,
        }
    }
}

impl FilterCriteria {
    /// Defaults seeded from the catalog's observed price range.
    pub fn for_catalog(catalog: &PropertyCatalog) -> Self {
        let (lo, hi) = catalog.price_bounds();
        Self {
            price: PriceBounds { lo, hi },
            ..Self::default()
        }
    }

    /// "Clear all": catalog defaults, keeping the guest minimum and viewport.
    pub fn reset(&mut self, catalog: &PropertyCatalog) {
        *self = Self {
            min_guests: self.min_guests,
            viewport: self.viewport,
            ..Self::for_catalog(catalog)
        };
    }

    /// Moves the low handle; pushes the high handle up if they would cross.
    pub fn set_price_lo(&mut self, lo: f64) {
        self.price.lo = lo;
        if lo >= self.price.hi {
            self.price.hi = lo + PRICE_GAP;
        }
    }

    /// Moves the high handle; pushes the low handle down if they would cross.
    pub fn set_price_hi(&mut self, hi: f64) {
        self.price.hi = hi;
        if hi <= self.price.lo {
            self.price.lo = hi - PRICE_GAP;
        }
    }

    pub fn min_rooms(&self, room: Room) -> u32 {
        match room {
            Room::Bedrooms => self.min_bedrooms,
            Room::Beds => self.min_beds,
            Room::Bathrooms => self.min_bathrooms,
        }
    }

    fn min_rooms_mut(&mut self, room: Room) -> &mut u32 {
        match room {
            Room::Bedrooms => &mut self.min_bedrooms,
            Room::Beds => &mut self.min_beds,
            Room::Bathrooms => &mut self.min_bathrooms,
        }
    }

    pub fn increment_rooms(&mut self, room: Room) {
        *self.min_rooms_mut(room) += 1;
    }

    /// Stops at 0 ("Any").
    pub fn decrement_rooms(&mut self, room: Room) {
        let value = self.min_rooms_mut(room);
        *value = value.saturating_sub(1);
    }

    /// Adds the type if absent, removes it if present.
    pub fn toggle_property_type(&mut self, property_type: &str) {
        if !self.property_types.remove(property_type) {
            self.property_types.insert(property_type.to_string());
        }
    }

    pub fn toggle_pets(&mut self) {
        self.pets_required = !self.pets_required;
    }

    /// Same constraints without the viewport.
    pub fn without_viewport(&self) -> Self {
        Self {
            viewport: None,
            ..self.clone()
        }
    }

    pub fn matches(&self, property: &Property) -> bool {
        if let Some(viewport) = &self.viewport {
            match property.coordinates() {
                Some(point) if viewport.contains(point) => {}
                _ => return false,
            }
        }

        let capacity = &property.capacity;
        if capacity.guests.is_some_and(|g| g < self.min_guests) {
            return false;
        }

        // Containment, not overlap.
        if property.price.min.is_some_and(|min| min < self.price.lo)
            || property.price.max.is_some_and(|max| max > self.price.hi)
        {
            return false;
        }

        if !self.property_types.is_empty() {
            match &property.property_type {
                Some(t) if self.property_types.contains(t) => {}
                _ => return false,
            }
        }

        if self.min_bedrooms > 0 && capacity.bedrooms.is_some_and(|n| n < self.min_bedrooms) {
            return false;
        }
        if self.min_beds > 0 && capacity.beds.is_some_and(|n| n < self.min_beds) {
            return false;
        }
        if self.min_bathrooms > 0
            && capacity
                .bathrooms
                .is_some_and(|n| n < self.min_bathrooms as f32)
        {
            return false;
        }

        !self.pets_required || property.pets_allowed
    }
}

/// Stateless filter over any property sequence.
pub struct FilterEngine;

impl FilterEngine {
    /// Stable filter: survivors keep their input order.
    pub fn apply(properties: &[Property], criteria: &FilterCriteria) -> Vec<Property> {
        properties
            .iter()
            .filter(|p| criteria.matches(p))
            .cloned()
            .collect()
    }
}
