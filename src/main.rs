//! CLI interface for park-predict

use anyhow::Result;
use clap::{Parser, Subcommand};
use park_predict::{LocationQuery, PredictionClient};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "park-predict")]
#[command(about = "AI-assisted parking search from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for parking near a location
    Search {
        /// Free-text location to search near
        #[arg(short, long, conflicts_with_all = ["lat", "lng"])]
        near: Option<String>,
        /// Latitude of a known position
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        /// Longitude of a known position
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
        /// Prediction model override
        #[arg(long)]
        model: Option<String>,
        /// Output file for JSON results
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Initialize logging to a daily-rolling file under logs/
fn init_logging() -> Result<()> {
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "park-predict.log");

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
                .add_directive("park_predict=debug".parse()?),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .json(),
        )
        .init();

    info!("Logging initialized - logs will be written to logs/park-predict.log.*");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        // Continue without logging rather than failing
    }

    match cli.command {
        Commands::Search {
            near,
            lat,
            lng,
            model,
            output,
        } => {
            let query = match (near, lat, lng) {
                (Some(text), None, None) => LocationQuery::from_text(&text)?,
                (None, Some(lat), Some(lng)) => LocationQuery::from_coordinates(lat, lng),
                _ => {
                    eprintln!("Specify either --near <text> or both --lat and --lng");
                    std::process::exit(2);
                }
            };

            let mut client = PredictionClient::from_env()?;
            if let Some(model) = model {
                client = client.with_model(model);
            }

            println!("Searching for parking...");
            match client.fetch_predictions(&query).await {
                Ok(lots) => {
                    let json = serde_json::to_string_pretty(&lots)?;

                    if let Some(output_file) = output {
                        fs::write(&output_file, &json)?;
                        println!("Results saved to {}", output_file);
                    } else {
                        println!("{}", json);
                    }

                    // Print summary
                    println!("\nSummary:");
                    println!("Found {} lots", lots.len());

                    if let Some(best) = lots.iter().max_by_key(|lot| lot.availability) {
                        println!(
                            "Most available: {} ({}%, {})",
                            best.name,
                            best.availability,
                            best.availability_level()
                        );
                    }
                    if let Some(cheapest) = lots.iter().min_by(|a, b| {
                        a.price_per_hour
                            .partial_cmp(&b.price_per_hour)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    }) {
                        println!(
                            "Cheapest: {} (${:.2}/hour)",
                            cheapest.name, cheapest.price_per_hour
                        );
                    }
                }
                Err(e) => {
                    eprintln!("Error searching for parking: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
