//! Keeps the card list and the map markers showing the same filtered set.

use crate::filter::{FilterCriteria, FilterEngine};
use crate::geo::{Bounds, Coordinates};
use crate::models::Property;
use std::collections::HashSet;
use tracing::debug;

/// Where the map should look.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCamera {
    pub center: Coordinates,
    pub zoom: u8,
}

/// The view layer: everything the core hands out for display.
pub trait View {
    fn render_cards(&mut self, cards: &[Property]);

    /// `camera` is set only when the map should move.
    fn render_map(&mut self, markers: &MarkerSet, camera: Option<MapCamera>);

    fn show_loading(&mut self);

    fn show_error(&mut self, message: &str);

    fn show_empty(&mut self, message: &str);

    /// Transient message, e.g. that a search had to widen its radius.
    fn show_notice(&mut self, message: &str);
}

/// Stable marker identity. Survives filtering; a replace issues new keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerKey(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub key: MarkerKey,
    pub listing_id: String,
    pub position: Coordinates,
    pub label: String,
    pub visible: bool,
}

/// Price text on a map pin.
fn marker_label(property: &Property) -> String {
    match property.price.shown() {
        (Some(min), Some(max)) if min != max => format!("${}-${}", min, max),
        (_, Some(max)) => format!("${}", max),
        _ => "N/A".to_string(),
    }
}

/// One marker per property with coordinates.
#[derive(Debug, Default)]
pub struct MarkerSet {
    markers: Vec<Marker>,
    next_key: u64,
}

impl MarkerSet {
    /// Drops every marker and creates fresh ones, all visible.
    pub fn replace(&mut self, properties: &[Property]) {
        let mut markers = Vec::with_capacity(properties.len());
        for property in properties {
            let Some(position) = property.coordinates() else {
                continue;
            };
            markers.push(Marker {
                key: MarkerKey(self.next_key),
                listing_id: property.id.clone(),
                position,
                label: marker_label(property),
                visible: true,
            });
            self.next_key += 1;
        }
        self.markers = markers;
    }

    /// Shows markers whose listing is in `ids`, hides the rest.
    pub fn set_visible(&mut self, ids: &HashSet<&str>) {
        for marker in &mut self.markers {
            marker.visible = ids.contains(marker.listing_id.as_str());
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| m.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }
}

/// Cards, markers and the latest unapplied viewport.
#[derive(Debug, Default)]
pub struct ViewSync {
    cards: Vec<Property>,
    markers: MarkerSet,
    pending_viewport: Option<Bounds>,
}

impl ViewSync {
    pub fn cards(&self) -> &[Property] {
        &self.cards
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Recomputes cards from `subset` and toggles marker visibility to match.
    pub fn refilter(&mut self, subset: &[Property], criteria: &FilterCriteria) -> &[Property] {
        self.cards = FilterEngine::apply(subset, criteria);
        let ids: HashSet<&str> = self.cards.iter().map(|p| p.id.as_str()).collect();
        self.markers.set_visible(&ids);
        debug!(
            "Showing {} markers, hiding {}",
            self.markers.visible_count(),
            self.markers.len() - self.markers.visible_count()
        );
        &self.cards
    }

    /// Replaces cards and rebuilds every marker from `properties`.
    pub fn replace(&mut self, properties: Vec<Property>) {
        self.markers.replace(&properties);
        self.cards = properties;
    }

    /// Records a viewport change. Returns the one it superseded, if any.
    pub fn queue_viewport(&mut self, bounds: Bounds) -> Option<Bounds> {
        self.pending_viewport.replace(bounds)
    }

    pub fn take_pending_viewport(&mut self) -> Option<Bounds> {
        self.pending_viewport.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::property;

    fn at(id: &str, lat: f64, lng: f64) -> Property {
        let mut p = property(id);
        p.location.coordinates = Some(Coordinates::new(lat, lng));
        p
    }

    #[test]
    fn properties_without_coordinates_get_no_marker() {
        let mut hidden = property("hidden");
        hidden.location.coordinates = None;
        let mut set = MarkerSet::default();
        set.replace(&[at("a", 1.0, 1.0), hidden]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.markers()[0].listing_id, "a");
    }

    #[test]
    fn replace_issues_new_keys() {
        let properties = [at("a", 1.0, 1.0), at("b", 2.0, 2.0)];
        let mut set = MarkerSet::default();
        set.replace(&properties);
        let before: Vec<_> = set.markers().iter().map(|m| m.key).collect();
        set.replace(&properties);
        let after: Vec<_> = set.markers().iter().map(|m| m.key).collect();
        assert!(before.iter().all(|k| !after.contains(k)));
    }

    #[test]
    fn refilter_toggles_visibility_without_recreating() {
        let properties = vec![at("a", 1.0, 1.0), at("b", 5.0, 5.0)];
        let mut sync = ViewSync::default();
        sync.replace(properties.clone());
        let keys: Vec<_> = sync.markers().markers().iter().map(|m| m.key).collect();

        let criteria = FilterCriteria {
            viewport: Some(Bounds::new(0.0, 0.0, 2.0, 2.0)),
            ..FilterCriteria::default()
        };
        let cards = sync.refilter(&properties, &criteria);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, "a");

        let visible: Vec<_> = sync.markers().visible().map(|m| m.listing_id.as_str()).collect();
        assert_eq!(visible, ["a"]);
        let keys_after: Vec<_> = sync.markers().markers().iter().map(|m| m.key).collect();
        assert_eq!(keys, keys_after);
    }

    #[test]
    fn latest_viewport_wins() {
        let mut sync = ViewSync::default();
        let first = Bounds::new(0.0, 0.0, 1.0, 1.0);
        let second = Bounds::new(1.0, 1.0, 2.0, 2.0);
        assert_eq!(sync.queue_viewport(first), None);
        assert_eq!(sync.queue_viewport(second), Some(first));
        assert_eq!(sync.take_pending_viewport(), Some(second));
        assert_eq!(sync.take_pending_viewport(), None);
    }

    #[test]
    fn marker_labels() {
        let mut p = property("p");
        assert_eq!(marker_label(&p), "$100-$150");
        p.price.max = None;
        assert_eq!(marker_label(&p), "N/A");
        p.price.max = Some(99.0);
        p.price.min = None;
        assert_eq!(marker_label(&p), "$99");
        p.price.min = Some(0.0);
        assert_eq!(marker_label(&p), "$99");
    }
}
