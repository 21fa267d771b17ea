use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use geoprice_core::{
    load_settings, validate, CarrierAvailabilityRule, Customer, DeliveryPricingPolicy,
    DeliverySettings, DistanceEngine, EnvConfigStore, GeoCoordinate, LayeredConfigStore,
    NoGeocoding, NoRouting, Order, OrderLine, PricingOutcome, Product, ProductKind,
    RoutingLookup, YamlConfigStore,
};
use geoprice_routing::{DistanceMatrixClient, DEFAULT_TIMEOUT_SECS};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geoprice")]
#[command(about = "Distance-based delivery pricing")]
struct Cli {
    /// YAML settings file; environment variables take precedence
    #[arg(long, env = "GEOPRICE_CONFIG")]
    config: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check a coordinate pair with the validator
    Validate {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// Price a delivery to a coordinate
    Quote {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Ask the GPS carrier for a checkout rate
    Rate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Physical item quantity on the order
        #[arg(long, default_value = "1")]
        quantity: f64,
    },
    /// Print the effective settings
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cli.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let settings = load_effective_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { lat, lon } => match validate(lat, lon) {
            None => println!("valid"),
            Some(err) => println!("invalid: {err}"),
        },
        Commands::Quote { lat, lon } => {
            let policy = build_policy(&settings)?;
            let mut customer = ad_hoc_customer(lat, lon);
            match policy.price(Some(&mut customer), &settings).await {
                PricingOutcome::Priced(priced) => println!(
                    "distance: {:.2} mi ({})\nrate: {:.2}/mi\ntotal: {:.2}",
                    priced.distance_miles, priced.method, priced.rate_per_mile, priced.total_cost
                ),
                PricingOutcome::Rejected(rejection) => println!("rejected: {rejection}"),
            }
        }
        Commands::Rate { lat, lon, quantity } => {
            let rule = CarrierAvailabilityRule::new(build_policy(&settings)?);
            let mut customer = ad_hoc_customer(lat, lon);
            let order = ad_hoc_order(quantity, &settings.delivery_product_name);
            match rule
                .is_available_and_price(&order, Some(&mut customer), &settings)
                .await
            {
                Some(priced) => println!("available: {:.2}", priced.total_cost),
                None => println!("unavailable"),
            }
        }
        Commands::Settings => println!("{settings:#?}"),
    }

    Ok(())
}

/// Environment over the optional YAML file over built-in defaults.
fn load_effective_settings(config: Option<&std::path::Path>) -> anyhow::Result<DeliverySettings> {
    let mut store = LayeredConfigStore::new().layer(EnvConfigStore::load());
    if let Some(path) = config {
        store = store.layer(YamlConfigStore::from_path(path)?);
    }
    load_settings(&store).context("failed to load delivery settings")
}

fn build_policy(settings: &DeliverySettings) -> anyhow::Result<DeliveryPricingPolicy> {
    let routing: Arc<dyn RoutingLookup> = if settings.use_external_routing {
        Arc::new(
            DistanceMatrixClient::new(DEFAULT_TIMEOUT_SECS)
                .context("failed to build routing client")?,
        )
    } else {
        Arc::new(NoRouting)
    };
    Ok(DeliveryPricingPolicy::new(
        DistanceEngine::new(routing),
        Arc::new(NoGeocoding),
    ))
}

fn ad_hoc_customer(lat: f64, lon: f64) -> Customer {
    Customer::new(0, "ad-hoc").with_coordinate(GeoCoordinate::new(lat, lon))
}

fn ad_hoc_order(quantity: f64, marker: &str) -> Order {
    let goods = Product {
        id: 0,
        name: "goods".to_string(),
        kind: ProductKind::Storable,
        active: true,
    };
    Order {
        id: 0,
        name: "ad-hoc".to_string(),
        customer_id: Some(0),
        shipping_customer_id: None,
        lines: vec![OrderLine::new(0, Some(goods), quantity, marker)],
    }
}
