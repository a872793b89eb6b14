//! Basic parking search example
//!
//! Requires GEMINI_API_KEY to be set.

use park_predict::{find_parking, LocationQuery};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let query = LocationQuery::from_text("Downtown Brooklyn, New York")?;

    println!("Searching for parking near Downtown Brooklyn...");
    match find_parking(&query).await {
        Ok(lots) => {
            println!("✅ Search completed successfully!");
            println!("Found {} lots", lots.len());

            // Display first few lots
            for (i, lot) in lots.iter().take(3).enumerate() {
                println!("\n--- Lot {} ---", i + 1);
                println!("Name: {}", lot.name);
                println!("Address: {}", lot.address);
                println!("Distance: {}", lot.distance);
                println!(
                    "Availability: {}% ({})",
                    lot.availability,
                    lot.availability_level()
                );
                println!("Price: ${:.2}/hour", lot.price_per_hour);
            }
        }
        Err(e) => {
            println!("⚠️  Search failed: {}", e);
        }
    }

    Ok(())
}
