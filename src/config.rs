use crate::search::RadiusPolicy;
use crate::{Error, Result};
use clap::Args;
use std::time::Duration;
use url::Url;

/// Proxy that fronts the catalog, places and availability services.
pub const DEFAULT_API_BASE: &str = "https://hostaway-proxy.triad-sync.workers.dev";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Runtime settings shared by the client and the search loop.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: Url,
    pub request_timeout: Duration,
    pub radius: RadiusPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("default API base is a valid URL"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            radius: RadiusPolicy::default(),
        }
    }
}

/// Command-line flags, each with an environment fallback.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Base URL of the listings proxy
    #[arg(long, env = "STAY_FINDER_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "STAY_FINDER_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// First search radius, in miles
    #[arg(long, env = "STAY_FINDER_START_RADIUS", default_value_t = RadiusPolicy::default().start)]
    pub start_radius: u32,

    /// Largest search radius, in miles
    #[arg(long, env = "STAY_FINDER_MAX_RADIUS", default_value_t = RadiusPolicy::default().max)]
    pub max_radius: u32,

    /// Radius increment between attempts, in miles
    #[arg(long, env = "STAY_FINDER_RADIUS_STEP", default_value_t = RadiusPolicy::default().step)]
    pub radius_step: u32,
}

impl ConfigArgs {
    pub fn into_config(self) -> Result<Config> {
        let api_base = Url::parse(&self.api_base)?;
        if self.timeout_secs == 0 {
            return Err(Error::Validation("timeout must be at least one second".into()));
        }
        let radius = RadiusPolicy::new(self.start_radius, self.max_radius, self.radius_step)?;
        Ok(Config {
            api_base,
            request_timeout: Duration::from_secs(self.timeout_secs),
            radius,
        })
    }
}
