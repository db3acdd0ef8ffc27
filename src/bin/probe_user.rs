//! Probe: Forge user endpoint + emissions weight endpoint
//!
//! Hits GET /api/upshot-api-proxy/allora/forge/user/<addr> and, for each
//! competition in the response, the latest_network_inferences endpoint, and
//! documents:
//! - Response shapes and field presence
//! - Weight list sizes and the probe address's standing per topic
//! - Latency per request

use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use allora_rank_bot::api::{AlloraClient, ForgeApi};
use allora_rank_bot::ranker::WeightBoard;
use allora_rank_bot::{EMISSIONS_VERSION, FORGE_API_BASE};

#[derive(Parser)]
#[command(name = "probe_user", about = "Probe the Forge user and weight endpoints")]
struct Args {
    /// Address to probe
    address: String,

    /// Chain REST API base URL (emissions endpoints)
    #[arg(long, default_value = "https://allora-api.testnet.allora.network")]
    api: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = AlloraClient::new(FORGE_API_BASE, &args.api)?;

    println!("=== Probe: Forge user ===");
    println!("Address: {}", args.address);
    println!("Emissions version: {EMISSIONS_VERSION}");
    println!();

    let start = Instant::now();
    let user = client.user_record(&args.address).await?;
    println!("--- 1. User record ---");
    println!("Latency: {:?}", start.elapsed());
    println!(
        "Name: {} {} (@{})",
        user.first_name, user.last_name, user.username
    );
    println!("Rank: #{} | Points: {:.2}", user.ranking, user.total_points);
    println!(
        "Badge: {} ({:.2}%)",
        user.badge_name, user.badge_percentile
    );
    println!("Competitions: {}", user.competitions.len());
    for comp in &user.competitions {
        println!(
            "  [{}] {} (topic {}) rank #{} points {:.2}",
            comp.id, comp.name, comp.topic_id, comp.ranking, comp.points
        );
    }
    println!();

    println!("--- 2. Weights per topic ---");
    for comp in &user.competitions {
        let start = Instant::now();
        match client.competition_weights(comp.topic_id).await {
            Ok(raw) => {
                let board = WeightBoard::from_raw(&raw);
                print!(
                    "topic {}: {} weights in {:?}",
                    comp.topic_id,
                    board.len(),
                    start.elapsed()
                );
                match board.standing(&args.address) {
                    Some(entry) => println!(
                        " — standing #{}/{} weight {:.8}",
                        entry.rank,
                        board.len(),
                        entry.weight
                    ),
                    None => println!(" — address not in weight set"),
                }
            }
            Err(e) => println!("topic {}: error: {e:#}", comp.topic_id),
        }
    }

    Ok(())
}
