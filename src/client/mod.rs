pub mod traits;
pub mod types;
pub mod worker;

pub use traits::{AvailabilityChecker, CatalogSource, Geocoder, PlaceSuggester};
pub use types::{AvailabilityQuery, Prediction, RawProperty};
pub use worker::WorkerClient;
