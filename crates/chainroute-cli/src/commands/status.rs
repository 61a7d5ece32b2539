//! `chainroute status` — Show live network conditions.

use chainroute_core::SpeedClass;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Deserialize;

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct NetworkLine {
    key: String,
    gas_price_gwei: f64,
    estimated_cost_usd: f64,
    speed_class: SpeedClass,
    reliability: f64,
    last_updated: Option<DateTime<Utc>>,
    fresh: bool,
}

#[derive(Deserialize)]
struct StatusResponse {
    networks: Vec<NetworkLine>,
    fresh_count: usize,
    last_update: Option<DateTime<Utc>>,
    monitoring: bool,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.endpoint);
    let status: StatusResponse = client.get("/networks/status").await?;

    println!("Node:        {}", args.endpoint);
    println!("Monitoring:  {}", if status.monitoring { "running" } else { "stopped" });
    match status.last_update {
        Some(ts) => println!("Last round:  {}", ts.to_rfc3339()),
        None => println!("Last round:  never"),
    }
    println!(
        "Fresh:       {} of {} networks",
        status.fresh_count,
        status.networks.len()
    );
    println!();
    println!(
        "  {:<10} {:>12} {:>12} {:<10} {:>8}  {:<6} {}",
        "NETWORK", "GAS (gwei)", "COST (USD)", "SPEED", "RELIAB", "FRESH", "UPDATED"
    );
    for n in &status.networks {
        println!(
            "  {:<10} {:>12.4} {:>12.6} {:<10} {:>8.2}  {:<6} {}",
            n.key,
            n.gas_price_gwei,
            n.estimated_cost_usd,
            n.speed_class.as_str(),
            n.reliability,
            if n.fresh { "yes" } else { "no" },
            n.last_updated
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".into()),
        );
    }
    Ok(())
}
