//! `chainroute analytics` — Summarize a merchant's routed payments.

use chainroute_routing::{AnalyticsSummary, TimeRange};
use clap::Args;

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct AnalyticsArgs {
    /// Merchant id.
    pub merchant: String,

    /// Time range: 24h, 7d or 30d.
    #[arg(short, long, default_value = "24h")]
    pub range: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &AnalyticsArgs) -> anyhow::Result<()> {
    // Fail fast on a typo instead of a round trip.
    let range: TimeRange = args.range.parse()?;
    let client = NodeClient::new(&args.endpoint);
    let summary: AnalyticsSummary = client
        .get(&format!("/routing/analytics/{}?range={}", args.merchant, range))
        .await?;

    println!("Merchant:        {}", summary.merchant_id);
    println!("Range:           {}", summary.time_range);
    println!("Payments:        {}", summary.total_payments);
    println!("Total savings:   ${:.6}", summary.total_savings_usd);
    println!("Average savings: ${:.6}", summary.average_savings_usd);
    println!("Fallbacks:       {}", summary.fallback_count);
    if !summary.network_usage.is_empty() {
        println!();
        println!("Network usage:");
        for (network, count) in &summary.network_usage {
            println!("  {network:<10} {count}");
        }
    }
    println!();
    println!("Recommendations:");
    for r in &summary.recommendations {
        println!("  - {r}");
    }
    Ok(())
}
