//! Session state owner. Wires user intents into filtering, searching and
//! the view layer.

use crate::catalog::PropertyCatalog;
use crate::client::{AvailabilityChecker, CatalogSource, Geocoder};
use crate::filter::FilterCriteria;
use crate::geo::{Bounds, Coordinates, NO_RESULTS_ZOOM};
use crate::models::Property;
use crate::search::{LocationSearch, RadiusPolicy, SearchResult, SearchSelection};
use crate::sync::{MapCamera, View, ViewSync};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

const EMPTY_VIEWPORT_MESSAGE: &str = "No properties in this area";
const LOAD_FAILED_MESSAGE: &str = "Failed to load properties. Please refresh the page.";

/// What the cards and markers are drawn from.
#[derive(Debug, Clone)]
enum ActiveSet {
    Catalog,
    Search(Vec<Property>),
}

/// Owns catalog, criteria, selection and markers for one session.
pub struct ListingsController<V: View> {
    catalog: Arc<PropertyCatalog>,
    criteria: FilterCriteria,
    selection: SearchSelection,
    active: ActiveSet,
    sync: ViewSync,
    policy: RadiusPolicy,
    generation: u64,
    last_search: Option<(SearchSelection, SearchResult)>,
    view: V,
}

impl<V: View> ListingsController<V> {
    /// Builds markers for the whole catalog and renders it.
    pub fn new(catalog: PropertyCatalog, policy: RadiusPolicy, view: V) -> Self {
        let criteria = FilterCriteria::for_catalog(&catalog);
        let mut controller = Self {
            catalog: Arc::new(catalog),
            criteria,
            selection: SearchSelection::default(),
            active: ActiveSet::Catalog,
            sync: ViewSync::default(),
            policy,
            generation: 0,
            last_search: None,
            view,
        };
        controller
            .sync
            .replace(controller.catalog.properties().to_vec());
        controller.refresh();
        controller
    }

    /// Fetches the catalog and starts a session. Fetch failures are shown
    /// and returned; nothing is retried.
    pub async fn load(
        source: &dyn CatalogSource,
        policy: RadiusPolicy,
        mut view: V,
    ) -> Result<Self> {
        view.show_loading();
        match PropertyCatalog::fetch(source).await {
            Ok(catalog) => Ok(Self::new(catalog, policy, view)),
            Err(err) => {
                warn!("Initialization failed: {}", err);
                view.show_error(LOAD_FAILED_MESSAGE);
                Err(err)
            }
        }
    }

    pub fn catalog(&self) -> &PropertyCatalog {
        &self.catalog
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn selection(&self) -> &SearchSelection {
        &self.selection
    }

    /// Search bar edits do not refilter; only a submission does.
    pub fn selection_mut(&mut self) -> &mut SearchSelection {
        &mut self.selection
    }

    pub fn cards(&self) -> &[Property] {
        self.sync.cards()
    }

    pub fn sync(&self) -> &ViewSync {
        &self.sync
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn last_search(&self) -> Option<&SearchResult> {
        self.last_search.as_ref().map(|(_, result)| result)
    }

    /// Applies a filter change and refilters.
    pub fn update_criteria(&mut self, change: impl FnOnce(&mut FilterCriteria)) {
        change(&mut self.criteria);
        debug!("Applying filters: {:?}", self.criteria);
        self.refresh();
    }

    /// "Clear all" in the filter panel.
    pub fn clear_filters(&mut self) {
        self.criteria.reset(&self.catalog);
        self.refresh();
    }

    /// Records a viewport change without refiltering yet.
    pub fn on_viewport_change(&mut self, bounds: Bounds) {
        if let Some(stale) = self.sync.queue_viewport(bounds) {
            debug!("Viewport {:?} superseded before refilter", stale);
        }
    }

    /// Refilters for the latest queued viewport. Returns false if none was queued.
    pub fn flush_viewport(&mut self) -> bool {
        match self.sync.take_pending_viewport() {
            Some(bounds) => {
                self.criteria.viewport = Some(bounds);
                self.refresh();
                true
            }
            None => false,
        }
    }

    pub fn set_viewport(&mut self, bounds: Bounds) {
        self.on_viewport_change(bounds);
        self.flush_viewport();
    }

    /// Waits for viewport events, keeps only the newest of a burst and
    /// refilters once. Returns false when the sender is gone.
    pub async fn follow_viewport(&mut self, events: &mut mpsc::UnboundedReceiver<Bounds>) -> bool {
        let Some(first) = events.recv().await else {
            return false;
        };
        self.on_viewport_change(first);
        while let Ok(next) = events.try_recv() {
            self.on_viewport_change(next);
        }
        self.flush_viewport();
        true
    }

    /// Validates the selection and snapshots what the search needs.
    ///
    /// Every call invalidates tickets handed out before it.
    pub fn begin_search(&mut self) -> Result<SearchTicket> {
        if let Err(err) = self.selection.validate() {
            self.view.show_error(&err.to_string());
            return Err(err);
        }
        self.generation += 1;
        info!("Search {} started: {:?}", self.generation, self.selection);
        self.view.show_loading();
        Ok(SearchTicket {
            generation: self.generation,
            catalog: Arc::clone(&self.catalog),
            selection: self.selection.clone(),
            criteria: self.criteria.clone(),
            policy: self.policy,
        })
    }

    /// Applies a finished search and shows its outcome.
    ///
    /// Returns `Ok(false)` for a stale outcome, which is dropped unseen.
    /// Failures are shown first and then handed back.
    pub fn complete_search(&mut self, outcome: SearchOutcome) -> Result<bool> {
        if outcome.generation != self.generation {
            debug!(
                "Discarding search {} (current is {})",
                outcome.generation, self.generation
            );
            return Ok(false);
        }

        match outcome.result {
            Ok(result) => {
                info!(
                    "Showing {} properties at {} mile radius (zoom: {})",
                    result.properties.len(),
                    result.radius,
                    result.zoom
                );
                self.criteria.min_guests = outcome.selection.guests();
                self.criteria.viewport = None;
                self.drop_pending_viewport();
                self.active = ActiveSet::Search(result.properties.clone());
                self.sync.replace(result.properties.clone());
                self.view.render_cards(self.sync.cards());
                self.view.render_map(
                    self.sync.markers(),
                    Some(MapCamera {
                        center: result.center,
                        zoom: result.zoom,
                    }),
                );
                if result.expanded {
                    self.view.show_notice(&format!(
                        "Expanded search to {} miles to find properties matching your criteria",
                        result.radius
                    ));
                }
                self.last_search = Some((outcome.selection, result));
                Ok(true)
            }
            Err(err @ Error::NoResults { .. }) => {
                info!("{}", err);
                self.drop_pending_viewport();
                self.view.show_empty(&format!(
                    "{}. Try adjusting your filters or dates.",
                    capitalize(&err.to_string())
                ));
                if let Some(center) = outcome.center {
                    self.view.render_map(
                        self.sync.markers(),
                        Some(MapCamera {
                            center,
                            zoom: NO_RESULTS_ZOOM,
                        }),
                    );
                }
                Err(err)
            }
            Err(err) => {
                warn!("Search error: {}", err);
                let message = match &err {
                    Error::Geocode(_) | Error::Validation(_) => capitalize(&err.to_string()),
                    _ => "Search failed. Please try again.".to_string(),
                };
                self.view.show_error(&message);
                Err(err)
            }
        }
    }

    /// begin, run and complete in one go.
    pub async fn search(
        &mut self,
        geocoder: &dyn Geocoder,
        availability: &dyn AvailabilityChecker,
    ) -> Result<()> {
        let ticket = self.begin_search()?;
        let outcome = ticket.run(geocoder, availability).await;
        self.complete_search(outcome).map(|_| ())
    }

    /// Forgets the search and goes back to the whole catalog.
    pub fn clear_search(&mut self) {
        self.generation += 1;
        self.selection.reset();
        self.last_search = None;
        self.active = ActiveSet::Catalog;
        self.sync.replace(self.catalog.properties().to_vec());
        self.refresh();
    }

    /// Page URL carrying the last successful search, as submitted.
    pub fn share_url(&self, page: &Url) -> Option<Url> {
        self.last_search
            .as_ref()
            .map(|(selection, _)| selection.share_url(page))
    }

    /// The map is about to recenter, so bounds reported before that are stale.
    fn drop_pending_viewport(&mut self) {
        if let Some(stale) = self.sync.take_pending_viewport() {
            debug!("Dropping viewport {:?} queued before the search", stale);
        }
    }

    fn refresh(&mut self) {
        let subset: &[Property] = match &self.active {
            ActiveSet::Catalog => self.catalog.properties(),
            ActiveSet::Search(properties) => properties,
        };
        let cards = self.sync.refilter(subset, &self.criteria);
        debug!(
            "{} of {} properties match filters",
            cards.len(),
            subset.len()
        );
        if cards.is_empty() {
            self.view.show_empty(EMPTY_VIEWPORT_MESSAGE);
        } else {
            self.view.render_cards(cards);
        }
        self.view.render_map(self.sync.markers(), None);
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Snapshot of one search submission.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
    catalog: Arc<PropertyCatalog>,
    selection: SearchSelection,
    criteria: FilterCriteria,
    policy: RadiusPolicy,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Runs geocoding and the radius loop without holding the controller.
    pub async fn run(
        self,
        geocoder: &dyn Geocoder,
        availability: &dyn AvailabilityChecker,
    ) -> SearchOutcome {
        let search = LocationSearch::new(geocoder, availability, self.policy);
        let (center, result) = match search.geocode(&self.selection).await {
            Ok(center) => (
                Some(center),
                search
                    .search_around(
                        center,
                        &self.selection,
                        &self.criteria,
                        self.catalog.properties(),
                    )
                    .await,
            ),
            Err(err) => (None, Err(err)),
        };
        SearchOutcome {
            generation: self.generation,
            selection: self.selection,
            center,
            result,
        }
    }
}

/// What a [`SearchTicket`] produced.
#[derive(Debug)]
pub struct SearchOutcome {
    pub generation: u64,
    pub selection: SearchSelection,
    /// Geocoded point, when geocoding succeeded.
    pub center: Option<Coordinates>,
    pub result: Result<SearchResult>,
}
