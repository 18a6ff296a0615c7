//! Search bar state and the progressive radius search.

use crate::client::{AvailabilityChecker, AvailabilityQuery, Geocoder, Prediction};
use crate::filter::{FilterCriteria, FilterEngine};
use crate::geo::{zoom_for_radius, Coordinates};
use crate::models::Property;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

pub const MIN_GUESTS: u32 = 1;
pub const MAX_GUESTS: u32 = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Radius schedule in miles: `start, start + step, ...` while `<= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiusPolicy {
    pub start: u32,
    pub max: u32,
    pub step: u32,
}

impl Default for RadiusPolicy {
    fn default() -> Self {
        Self {
            start: 30,
            max: 200,
            step: 30,
        }
    }
}

impl RadiusPolicy {
    pub fn new(start: u32, max: u32, step: u32) -> Result<Self> {
        if start == 0 || step == 0 {
            return Err(Error::Validation(
                "search radius and step must be positive".into(),
            ));
        }
        if start > max {
            return Err(Error::Validation(format!(
                "start radius {} exceeds max radius {}",
                start, max
            )));
        }
        Ok(Self { start, max, step })
    }

    pub fn radii(&self) -> impl Iterator<Item = u32> {
        let RadiusPolicy { start, max, step } = *self;
        std::iter::successors(Some(start), move |r| r.checked_add(step))
            .take_while(move |r| *r <= max)
    }
}

/// A location picked from suggestions, or typed text awaiting a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedLocation {
    pub description: String,
    pub place_id: Option<String>,
}

impl From<Prediction> for SelectedLocation {
    fn from(prediction: Prediction) -> Self {
        Self {
            description: prediction.description,
            place_id: Some(prediction.place_id),
        }
    }
}

/// Which date a single-calendar pick landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePick {
    Checkin,
    Checkout,
}

/// Search bar state.
///
/// Dates are date-only, and a set checkout is always after the checkin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSelection {
    location: Option<SelectedLocation>,
    checkin: Option<NaiveDate>,
    checkout: Option<NaiveDate>,
    guests: u32,
}

impl Default for SearchSelection {
    fn default() -> Self {
        Self {
            location: None,
            checkin: None,
            checkout: None,
            guests: MIN_GUESTS,
        }
    }
}

impl SearchSelection {
    pub fn location(&self) -> Option<&SelectedLocation> {
        self.location.as_ref()
    }

    pub fn checkin(&self) -> Option<NaiveDate> {
        self.checkin
    }

    pub fn checkout(&self) -> Option<NaiveDate> {
        self.checkout
    }

    pub fn guests(&self) -> u32 {
        self.guests
    }

    /// Both dates, when both are set.
    pub fn dates(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.checkin.zip(self.checkout)
    }

    pub fn select_location(&mut self, location: impl Into<SelectedLocation>) {
        self.location = Some(location.into());
    }

    pub fn clear_location(&mut self) {
        self.location = None;
    }

    /// Sets check-in and clears check-out. Past days are rejected.
    pub fn select_checkin(&mut self, date: NaiveDate, today: NaiveDate) -> Result<()> {
        if date < today {
            return Err(Error::Validation("Check-in cannot be in the past".into()));
        }
        self.checkin = Some(date);
        self.checkout = None;
        Ok(())
    }

    /// Rejects without touching state unless `date` is after check-in.
    pub fn select_checkout(&mut self, date: NaiveDate) -> Result<()> {
        match self.checkin {
            None => Err(Error::Validation("Select a check-in date first".into())),
            Some(checkin) if date <= checkin => Err(Error::Validation(
                "Check-out must be after check-in".into(),
            )),
            Some(_) => {
                self.checkout = Some(date);
                Ok(())
            }
        }
    }

    /// Single-calendar picking: check-in, then check-out, then start over.
    pub fn pick_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<DatePick> {
        match (self.checkin, self.checkout) {
            (Some(_), None) => self.select_checkout(date).map(|_| DatePick::Checkout),
            _ => self.select_checkin(date, today).map(|_| DatePick::Checkin),
        }
    }

    pub fn clear_dates(&mut self) {
        self.checkin = None;
        self.checkout = None;
    }

    pub fn set_guests(&mut self, guests: u32) {
        self.guests = guests.clamp(MIN_GUESTS, MAX_GUESTS);
    }

    pub fn increment_guests(&mut self) {
        self.set_guests(self.guests + 1);
    }

    pub fn decrement_guests(&mut self) {
        self.set_guests(self.guests.saturating_sub(1));
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Checks everything a submission needs; returns the place id.
    pub fn validate(&self) -> Result<&str> {
        let place_id = self
            .location
            .as_ref()
            .and_then(|l| l.place_id.as_deref())
            .ok_or_else(|| Error::Validation("Please enter a location".into()))?;
        if let Some((checkin, checkout)) = self.dates() {
            if checkout <= checkin {
                return Err(Error::Validation("Check-out must be after check-in".into()));
            }
        }
        Ok(place_id)
    }

    /// Mirrors the selection into `location`, `checkin`, `checkout` and
    /// `guests` query parameters, replacing any previous values.
    pub fn share_url(&self, page: &Url) -> Url {
        let keep: Vec<(String, String)> = page
            .query_pairs()
            .filter(|(k, _)| !matches!(k.as_ref(), "location" | "checkin" | "checkout" | "guests"))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = page.clone();
        url.set_query(None);
        {
            let mut query = url.query_pairs_mut();
            query.extend_pairs(keep);
            if let Some(location) = &self.location {
                query.append_pair("location", &location.description);
            }
            if let Some(checkin) = self.checkin {
                query.append_pair("checkin", &checkin.format(DATE_FORMAT).to_string());
            }
            if let Some(checkout) = self.checkout {
                query.append_pair("checkout", &checkout.format(DATE_FORMAT).to_string());
            }
            query.append_pair("guests", &self.guests.to_string());
        }
        url
    }

    /// Restores a selection from a shared URL.
    ///
    /// The location comes back as text only and needs a fresh place lookup.
    /// Malformed values are ignored.
    pub fn from_url(url: &Url) -> Self {
        let mut selection = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "location" if !value.trim().is_empty() => {
                    selection.location = Some(SelectedLocation {
                        description: value.trim().to_string(),
                        place_id: None,
                    })
                }
                "checkin" => selection.checkin = NaiveDate::parse_from_str(&value, DATE_FORMAT).ok(),
                "checkout" => {
                    selection.checkout = NaiveDate::parse_from_str(&value, DATE_FORMAT).ok()
                }
                "guests" => {
                    if let Ok(guests) = value.parse::<u32>() {
                        selection.set_guests(guests);
                    }
                }
                _ => {}
            }
        }
        match selection.dates() {
            Some((checkin, checkout)) if checkout <= checkin => selection.checkout = None,
            None if selection.checkin.is_none() => selection.checkout = None,
            _ => {}
        }
        selection
    }
}

/// Properties found by a radius search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub properties: Vec<Property>,
    pub center: Coordinates,
    /// Radius that produced the result, in miles.
    pub radius: u32,
    pub zoom: u8,
    /// The first radius was not enough.
    pub expanded: bool,
}

/// Geocode, then grow the radius until something matches.
pub struct LocationSearch<'a> {
    geocoder: &'a dyn Geocoder,
    availability: &'a dyn AvailabilityChecker,
    policy: RadiusPolicy,
}

impl<'a> LocationSearch<'a> {
    pub fn new(
        geocoder: &'a dyn Geocoder,
        availability: &'a dyn AvailabilityChecker,
        policy: RadiusPolicy,
    ) -> Self {
        Self {
            geocoder,
            availability,
            policy,
        }
    }

    pub async fn execute(
        &self,
        selection: &SearchSelection,
        criteria: &FilterCriteria,
        catalog: &[Property],
    ) -> Result<SearchResult> {
        let center = self.geocode(selection).await?;
        self.search_around(center, selection, criteria, catalog).await
    }

    pub async fn geocode(&self, selection: &SearchSelection) -> Result<Coordinates> {
        let place_id = selection.validate()?;
        self.geocoder.geocode(place_id).await
    }

    /// The radius loop, from an already geocoded point.
    ///
    /// The viewport is ignored and the guest minimum is raised to the
    /// selection's guest count.
    pub async fn search_around(
        &self,
        center: Coordinates,
        selection: &SearchSelection,
        criteria: &FilterCriteria,
        catalog: &[Property],
    ) -> Result<SearchResult> {
        let mut criteria = criteria.without_viewport();
        criteria.min_guests = criteria.min_guests.max(selection.guests());

        for radius in self.policy.radii() {
            let nearby: Vec<Property> = catalog
                .iter()
                .filter(|p| {
                    p.coordinates()
                        .is_some_and(|point| center.distance_miles(&point) <= radius as f64)
                })
                .cloned()
                .collect();
            info!("Found {} properties within {} miles", nearby.len(), radius);

            if nearby.is_empty() {
                continue;
            }

            let available = match selection.dates() {
                Some((checkin, checkout)) => {
                    let query = AvailabilityQuery {
                        checkin,
                        checkout,
                        guests: selection.guests(),
                        center,
                    };
                    let available = self.check_availability(&query, nearby).await;
                    if available.is_empty() {
                        debug!("Nothing available within {} miles", radius);
                        continue;
                    }
                    available
                }
                None => nearby,
            };

            let properties = FilterEngine::apply(&available, &criteria);
            info!(
                "{} properties match all criteria at {} mile radius",
                properties.len(),
                radius
            );

            if !properties.is_empty() {
                let zoom = zoom_for_radius(radius);
                return Ok(SearchResult {
                    properties,
                    center,
                    radius,
                    zoom,
                    expanded: radius > self.policy.start,
                });
            }
        }

        Err(Error::NoResults {
            radius: self.policy.max,
        })
    }

    /// Intersects `nearby` with the available ids. Fails open.
    async fn check_availability(
        &self,
        query: &AvailabilityQuery,
        nearby: Vec<Property>,
    ) -> Vec<Property> {
        match self.availability.available(query, &nearby).await {
            Ok(ids) => {
                let available: Vec<Property> =
                    nearby.into_iter().filter(|p| ids.contains(&p.id)).collect();
                debug!("{} available properties in radius", available.len());
                available
            }
            Err(err) => {
                warn!("Availability check failed, assuming all available: {}", err);
                nearby
            }
        }
    }
}
