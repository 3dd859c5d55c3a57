use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use sangat_locator::geo::Coordinate;
use sangat_locator::location::{
    nearest, search, CatalogStore, DirectoryGallery, Resolution, SlugDomain, SlugResolver,
};
use sangat_locator::logging::init_logging;
use sangat_locator::server::{self, AppState};

/// Locator: proximity search and URL resolution for centers, satsangs and
/// events.
///
/// Examples:
///   locator serve --port 3101
///   locator nearest --lat 40.7128 --lng -74.0060
///   locator events "Lake Side"
///   locator events lakeside --radius 100
///   locator resolve "fall retreat" --domain event
#[derive(Parser)]
#[command(name = "locator", version, about, long_about = None)]
struct Cli {
    /// Catalog file (JSON array of records).
    #[arg(long, global = true, env = "LOCATOR_CATALOG")]
    catalog: Option<PathBuf>,

    /// Log at debug level when RUST_LOG is unset.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, env = "PORT", default_value_t = 3101)]
        port: u16,

        /// Folder holding CenterGallery/ and SatsangGallery/.
        #[arg(long, env = "LOCATOR_MEDIA_BASE_PATH")]
        media_path: Option<PathBuf>,

        /// Public URL prefix for gallery photos.
        #[arg(long, env = "LOCATOR_MEDIA_BASE_LINK_PREFIX", default_value = "")]
        media_link: String,
    },

    /// Nearest distinct map points to a coordinate.
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Number of points.
        #[arg(long, short = 'k', default_value_t = nearest::POINT_COUNT)]
        k: usize,
    },

    /// Events around the location a slug names.
    Events {
        slug: String,

        /// Fixed radius in miles instead of staged widening.
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Resolve a URL slug to a catalog record.
    Resolve {
        slug: String,

        #[arg(long, value_enum, default_value_t = Domain::Location)]
        domain: Domain,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Domain {
    Location,
    Event,
    Master,
    Online,
}

impl From<Domain> for SlugDomain {
    fn from(d: Domain) -> Self {
        match d {
            Domain::Location => SlugDomain::Location,
            Domain::Event => SlugDomain::Event,
            Domain::Master => SlugDomain::MasterEvent,
            Domain::Online => SlugDomain::OnlineEvent,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = cli.catalog.clone().unwrap_or_else(CatalogStore::default_path);
    let store = CatalogStore::from_path(&path).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    match cli.command {
        Command::Serve { host, port, media_path, media_link } => {
            let gallery = media_path.map(|base| DirectoryGallery::new(base, media_link));
            if gallery.is_none() {
                tracing::warn!("No media path configured, galleries will be empty");
            }
            let state = Arc::new(AppState { store, gallery });
            if let Err(e) = server::start(&host, port, state).await {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Nearest { lat, lng, k } => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                eprintln!("Error: Invalid coordinates. Lat: -90..90, Lng: -180..180");
                std::process::exit(1);
            }
            let origin = Coordinate::new(lat, lng);
            emit(&nearest::nearest_k(&store, &origin, k));
        }
        Command::Events { slug, radius } => {
            let results = match radius {
                Some(r) => search::events_within_radius_by_location(&store, &slug, r),
                None => search::events_by_location(&store, &slug),
            };
            emit(&results);
        }
        Command::Resolve { slug, domain } => {
            let resolution = SlugResolver::new(&store).resolve(&slug, domain.into());
            match resolution {
                Ok(Resolution::Found { record, .. }) => print_json(&record),
                Ok(Resolution::NotFound { slug }) => {
                    eprintln!("No match for '{}'", slug);
                    std::process::exit(2);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Print a result as pretty JSON on stdout, or the error on stderr.
fn emit<T: Serialize, E: std::fmt::Display>(result: &Result<T, E>) {
    match result {
        Ok(value) => print_json(value),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Cannot encode output: {}", e);
            std::process::exit(1);
        }
    }
}
