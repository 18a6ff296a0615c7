use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use stay_finder::client::{PlaceSuggester, WorkerClient};
use stay_finder::config::ConfigArgs;
use stay_finder::filter::Room;
use stay_finder::sync::{MapCamera, MarkerSet, View};
use stay_finder::{Bounds, ListingsController, Property};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "stay-finder")]
#[command(about = "Search vacation rental listings by location, dates and amenities")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog through the filters
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Only properties inside SOUTH,WEST,NORTH,EAST
        #[arg(long, value_parser = parse_bounds, allow_hyphen_values = true)]
        bounds: Option<Bounds>,
    },

    /// Show location suggestions for a query
    Suggest {
        query: String,
    },

    /// Radius search around a location
    Search {
        /// Free-text location; the first suggestion is used
        location: String,

        #[arg(long)]
        checkin: Option<NaiveDate>,

        #[arg(long)]
        checkout: Option<NaiveDate>,

        #[arg(short, long, default_value_t = 1)]
        guests: u32,

        #[command(flatten)]
        filters: FilterArgs,

        /// Page URL to append the shareable search parameters to
        #[arg(long)]
        share: Option<Url>,
    },
}

#[derive(Debug, Clone, clap::Args)]
struct FilterArgs {
    #[arg(long)]
    min_price: Option<f64>,

    #[arg(long)]
    max_price: Option<f64>,

    #[arg(long, default_value_t = 0)]
    bedrooms: u32,

    #[arg(long, default_value_t = 0)]
    beds: u32,

    #[arg(long, default_value_t = 0)]
    bathrooms: u32,

    /// Accepted property type; repeat for several
    #[arg(long = "type")]
    property_types: Vec<String>,

    #[arg(long)]
    pets: bool,
}

impl FilterArgs {
    fn apply<V: View>(&self, controller: &mut ListingsController<V>) {
        let args = self.clone();
        controller.update_criteria(move |criteria| {
            if let Some(lo) = args.min_price {
                criteria.set_price_lo(lo);
            }
            if let Some(hi) = args.max_price {
                criteria.set_price_hi(hi);
            }
            for (room, count) in [
                (Room::Bedrooms, args.bedrooms),
                (Room::Beds, args.beds),
                (Room::Bathrooms, args.bathrooms),
            ] {
                for _ in 0..count {
                    criteria.increment_rooms(room);
                }
            }
            for property_type in &args.property_types {
                criteria.toggle_property_type(property_type);
            }
            if args.pets {
                criteria.toggle_pets();
            }
        });
    }
}

fn parse_bounds(value: &str) -> Result<Bounds, String> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|err| format!("invalid bounds {:?}: {}", value, err))?;
    match parts.as_slice() {
        [south, west, north, east] => Ok(Bounds::new(*south, *west, *north, *east)),
        _ => Err("expected SOUTH,WEST,NORTH,EAST".to_string()),
    }
}

/// Prints to stdout. Only the latest card render is kept for the final listing.
#[derive(Default)]
struct TerminalView {
    cards: Vec<Property>,
}

impl TerminalView {
    fn print_cards(&self) {
        for (i, property) in self.cards.iter().enumerate() {
            println!("{}. {} ({}/night)", i + 1, property.name, property.price.display());
            println!("   {} · {}", property.type_label(), property.place_label());
            println!(
                "   Guests: {} • Bedrooms: {} • Bathrooms: {}",
                property.capacity.guests.unwrap_or(0),
                property.capacity.bedrooms.unwrap_or(0),
                property.capacity.bathrooms.unwrap_or(0.0)
            );
            if let Some(rating) = property.average_rating {
                println!("   Rating: {}", rating);
            }
            println!("   ID: {}", property.id);
            println!("   URL: {}", property.listing_path());
            println!("   Image: {}", property.image_url());
            println!();
        }
    }
}

impl View for TerminalView {
    fn render_cards(&mut self, cards: &[Property]) {
        self.cards = cards.to_vec();
    }

    fn render_map(&mut self, markers: &MarkerSet, camera: Option<MapCamera>) {
        info!(
            "Map: {} of {} markers visible",
            markers.visible_count(),
            markers.len()
        );
        if let Some(camera) = camera {
            info!(
                "Map centered on {}, {} (zoom {})",
                camera.center.lat, camera.center.lng, camera.zoom
            );
        }
    }

    fn show_loading(&mut self) {
        info!("Loading...");
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("⚠️ {}", message);
    }

    fn show_empty(&mut self, message: &str) {
        self.cards.clear();
        println!("{}", message);
    }

    fn show_notice(&mut self, message: &str) {
        println!("ℹ️ {}", message);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stay_finder=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.into_config().context("Invalid configuration")?;
    let client = WorkerClient::new(&config)?;

    match cli.command {
        Command::Suggest { query } => {
            let predictions = client.suggest(&query).await?;
            if predictions.is_empty() {
                println!("No suggestions for {:?}", query);
            }
            for prediction in predictions {
                println!("{}  [{}]", prediction.description, prediction.place_id);
            }
        }
        Command::List { filters, bounds } => {
            let mut controller =
                ListingsController::load(&client, config.radius, TerminalView::default())
                    .await
                    .context("Failed to load properties")?;
            filters.apply(&mut controller);
            if let Some(bounds) = bounds {
                controller.set_viewport(bounds);
            }
            info!(
                "{} of {} properties match",
                controller.cards().len(),
                controller.catalog().len()
            );
            controller.view().print_cards();
        }
        Command::Search {
            location,
            checkin,
            checkout,
            guests,
            filters,
            share,
        } => {
            let mut controller =
                ListingsController::load(&client, config.radius, TerminalView::default())
                    .await
                    .context("Failed to load properties")?;
            filters.apply(&mut controller);

            let Some(prediction) = client.suggest(&location).await?.into_iter().next() else {
                bail!("No place matches {:?}", location);
            };
            info!("Using location: {}", prediction.description);

            let today = Local::now().date_naive();
            let selection = controller.selection_mut();
            selection.select_location(prediction);
            selection.set_guests(guests);
            if let Some(checkin) = checkin {
                selection.select_checkin(checkin, today)?;
            }
            if let Some(checkout) = checkout {
                selection.select_checkout(checkout)?;
            }

            match controller.search(&client, &client).await {
                Ok(()) => {
                    controller.view().print_cards();
                    if let Some(page) = share {
                        if let Some(url) = controller.share_url(&page) {
                            println!("Share: {}", url);
                        }
                    }
                }
                Err(stay_finder::Error::NoResults { .. }) => {}
                Err(err) => return Err(err).context("Search failed"),
            }
        }
    }

    Ok(())
}
