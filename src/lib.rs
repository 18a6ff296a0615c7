//! Property listings search: catalog ingestion, multi-criteria filtering,
//! progressive radius search and map/list synchronization.
//!
//! The crate has no UI of its own. A [`sync::View`] implementation receives
//! the filtered cards and marker visibility, and feeds viewport and filter
//! changes back into a [`controller::ListingsController`].

pub mod catalog;
pub mod client;
pub mod config;
pub mod controller;
pub mod filter;
pub mod geo;
pub mod models;
pub mod search;
pub mod sync;

pub use catalog::PropertyCatalog;
pub use config::Config;
pub use controller::ListingsController;
pub use filter::{FilterCriteria, FilterEngine};
pub use geo::{Bounds, Coordinates};
pub use models::Property;
pub use search::{LocationSearch, SearchResult, SearchSelection};

use thiserror::Error;

/// Crate-specific error enum.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote catalog was unreachable or answered with a non-2xx status.
    #[error("failed to fetch properties: {0}")]
    Fetch(String),

    /// The place details response carried no usable coordinates.
    #[error("could not get location coordinates for {0}")]
    Geocode(String),

    /// The availability service failed.
    ///
    /// Never fatal to a search: the radius loop treats it as "everything
    /// nearby is available".
    #[error("availability check failed: {0}")]
    Availability(String),

    /// The radius search ran out of radius without a match.
    #[error("no properties found within {radius} miles that match your search criteria")]
    NoResults {
        /// Largest radius attempted, in miles.
        radius: u32,
    },

    /// Rejected user input, reported before any network call.
    #[error("{0}")]
    Validation(String),

    /// A request timed out or could not connect.
    #[error("network error: {0}")]
    Network(String),

    /// [serde_json::Error]
    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    /// [url::ParseError]
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Error::Network(err.to_string())
        } else if err.is_decode() {
            Error::Fetch(format!("invalid response body: {}", err))
        } else {
            Error::Fetch(err.to_string())
        }
    }
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
