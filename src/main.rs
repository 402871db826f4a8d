use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use stay_scout::hosting::{
    BookingSource, DashboardAggregator, DashboardOutcome, ReservationBook, ReservationCategorizer,
    ReservationCategory, ReservationTab,
};
use stay_scout::search::{
    rank_filtered, Coordinates, DateRange, LocationQuery, Place, RadiusPolicy, SearchFilters, SearchOutcome,
    ResultFilter, SearchResolver, SearchSession, SearchState, SortDirection, SortField, SortOrder,
};
use stay_scout::{MarketplaceClient, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stay-scout", version, about = "Search stays and review host reservations")]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search properties, relaxing the location until something matches
    Search(SearchArgs),
    /// Show host reservations grouped into tabs
    Reservations {
        /// Read bookings from a JSON file instead of the backend
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "all")]
        tab: ReservationTab,
    },
    /// Print the host dashboard as JSON
    Dashboard {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Free-text location, e.g. "Springfield, Illinois, USA"
    #[arg(default_value = "")]
    text: String,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<String>,
    #[arg(long)]
    radius: Option<String>,
    #[arg(long)]
    check_in: Option<String>,
    #[arg(long)]
    check_out: Option<String>,
    #[arg(long)]
    guests: Option<u32>,
    #[arg(long = "type")]
    property_type: Option<String>,
    #[arg(long)]
    min_price: Option<f64>,
    #[arg(long)]
    max_price: Option<f64>,
    /// Hide results rated below this
    #[arg(long)]
    min_rating: Option<f64>,
    #[arg(long = "amenity")]
    amenities: Vec<String>,
    #[arg(long, value_enum, default_value_t = SortArg::Newest)]
    sort: SortArg,
    /// Sort ascending instead of descending
    #[arg(long)]
    asc: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Price,
    Rating,
    Newest,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Price => SortField::Price,
            SortArg::Rating => SortField::Rating,
            SortArg::Newest => SortField::Newest,
        }
    }
}

impl SearchArgs {
    fn result_filter(&self) -> ResultFilter {
        ResultFilter {
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
        }
    }

    fn into_state(self) -> SearchState {
        let coordinates = match (&self.lat, &self.lng) {
            (Some(lat), Some(lng)) => Coordinates::parse(lat, lng, self.radius.as_deref()),
            _ => None,
        };
        let query = LocationQuery::from_text(&self.text)
            .with_place(Place::new(
                self.city.as_deref(),
                self.state.as_deref(),
                self.country.as_deref(),
            ))
            .with_coordinates(coordinates);

        let dates = match (&self.check_in, &self.check_out) {
            (Some(start), Some(end)) => DateRange::parse(start, end),
            _ => None,
        };
        let direction = if self.asc { SortDirection::Asc } else { SortDirection::Desc };

        SearchState {
            query,
            filters: SearchFilters {
                dates,
                guests: self.guests,
                property_type: self.property_type,
                min_price: self.min_price,
                max_price: self.max_price,
                amenities: self.amenities,
            },
            order: SortOrder::new(self.sort.into(), direction),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::new(cli.config.as_deref()).context("Failed to load settings")?;
    let client = MarketplaceClient::new(&settings.api)?;

    match cli.command {
        Command::Search(args) => {
            let filter = args.result_filter();
            let state = args.into_state();
            let session = SearchSession::new(
                SearchResolver::new(client, RadiusPolicy::from(&settings.search)),
                Duration::from_millis(settings.search.debounce_ms),
            );

            info!("Searching {}", session.resolver().source().base_url());
            let outcome = session
                .submit_now(state.clone())
                .await
                .context("Search was superseded")?;

            match outcome {
                SearchOutcome::Found { tier, properties } => {
                    info!("Found {} properties at the {} tier\n", properties.len(), tier);
                    let ranked = rank_filtered(&properties, state.order, &filter);
                    for (i, property) in ranked.iter().enumerate() {
                        println!("{}. {} ({:.2} {})", i + 1, property.title, property.price, property.currency);
                        println!("   {}", property.location);
                        println!("   Rating: {:.1} ({} reviews)", property.rating, property.review_count);
                        println!("   ID: {}", property.id);
                        println!();
                    }
                }
                SearchOutcome::Empty { attempts } => {
                    info!("No properties matched after {} queries", attempts);
                }
                SearchOutcome::Failed { tier, error } => {
                    let hint = if error.is_retryable() { " (retryable)" } else { "" };
                    bail!("Search failed at the {} tier{}: {}", tier, hint, error);
                }
            }
        }
        Command::Reservations { file, tab } => {
            let now = Local::now();
            let book = match file {
                Some(path) => ReservationBook::from_payload(&read_json(&path).await?, now.with_timezone(&Utc)),
                None => {
                    let mut book = ReservationBook::new();
                    book.refresh(&client, now.with_timezone(&Utc)).await?;
                    book
                }
            };

            let categorizer = ReservationCategorizer::new((&settings.reservations).into());
            let categorized = book.categorize(&categorizer, &now);

            for category in ReservationCategory::DISPLAY_ORDER {
                info!("{}: {}", category, categorized.count(category));
            }

            for reservation in categorized.view(tab) {
                let category = categorizer
                    .categorize(reservation, &now)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| reservation.status.as_str().to_string());
                println!("[{}] {} at {}", category, reservation.guest_name, reservation.property_name);
                println!(
                    "   {} -> {}",
                    reservation.check_in.local(&Local).format("%Y-%m-%d %H:%M"),
                    reservation.check_out.local(&Local).format("%Y-%m-%d %H:%M")
                );
                println!(
                    "   {:.2} {}",
                    reservation.total_amount,
                    if reservation.is_paid { "paid" } else { "unpaid" }
                );
            }
        }
        Command::Dashboard { file } => {
            let response = match file {
                Some(path) => Ok(read_json(&path).await?),
                None => client.host_bookings().await,
            };

            let aggregator = DashboardAggregator::new(settings.reservations.recent_limit);
            match aggregator.from_response(response, &Local::now()) {
                DashboardOutcome::Ready(dashboard) => {
                    println!("{}", serde_json::to_string_pretty(&dashboard)?);
                }
                DashboardOutcome::OnboardingRequired(dashboard) => {
                    info!("Host onboarding is not complete yet");
                    println!("{}", serde_json::to_string_pretty(&dashboard)?);
                }
                DashboardOutcome::Failed(error) => bail!("Failed to load dashboard: {}", error),
            }
        }
    }

    Ok(())
}

async fn read_json(path: &Path) -> anyhow::Result<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}
