use serde::{Deserialize, Serialize};

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in miles.
    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        haversine_miles(*self, *other)
    }
}

/// Haversine distance between two points, in miles.
pub fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_MILES * c
}

/// A rectangular lat/lng bound, as reported by the map for its visible area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Coordinates) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }
}

/// Map zoom level for a search radius in miles.
pub fn zoom_for_radius(radius_miles: u32) -> u8 {
    match radius_miles {
        0..=30 => 10,
        31..=60 => 9,
        61..=100 => 8,
        101..=150 => 7,
        _ => 6,
    }
}

/// Zoom used to recenter the map when a search finds nothing.
pub const NO_RESULTS_ZOOM: u8 = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_miles(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 1.0));
        assert!((d - 69.17).abs() / 69.17 < 0.01, "got {}", d);
    }

    #[test]
    fn distance_is_symmetric_and_zero_for_same_point() {
        let nyc = Coordinates::new(40.7128, -74.0060);
        let philly = Coordinates::new(39.9526, -75.1652);
        assert_eq!(nyc.distance_miles(&nyc), 0.0);
        let there = nyc.distance_miles(&philly);
        let back = philly.distance_miles(&nyc);
        assert!((there - back).abs() < 1e-9);
        assert!(there > 75.0 && there < 85.0);
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounds = Bounds::new(10.0, 20.0, 11.0, 21.0);
        assert!(bounds.contains(Coordinates::new(10.0, 20.0)));
        assert!(bounds.contains(Coordinates::new(11.0, 21.0)));
        assert!(bounds.contains(Coordinates::new(10.5, 20.5)));
        assert!(!bounds.contains(Coordinates::new(11.0001, 20.5)));
        assert!(!bounds.contains(Coordinates::new(10.5, 19.9)));
    }

    #[test]
    fn zoom_breakpoints() {
        assert_eq!(zoom_for_radius(30), 10);
        assert_eq!(zoom_for_radius(60), 9);
        assert_eq!(zoom_for_radius(90), 8);
        assert_eq!(zoom_for_radius(100), 8);
        assert_eq!(zoom_for_radius(120), 7);
        assert_eq!(zoom_for_radius(150), 7);
        assert_eq!(zoom_for_radius(180), 6);
        assert_eq!(zoom_for_radius(210), 6);
    }
}
