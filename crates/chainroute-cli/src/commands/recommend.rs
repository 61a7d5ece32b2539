//! `chainroute recommend` — Show the unbiased best network for a payment.

use chainroute_routing::RecommendationReport;
use clap::Args;

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Payment amount.
    #[arg(short, long)]
    pub amount: f64,

    /// Urgency (low, normal, high).
    #[arg(short, long, default_value = "normal")]
    pub urgency: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &RecommendArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.endpoint);
    let path = format!(
        "/routing/recommendations?amount={}&urgency={}",
        args.amount, args.urgency
    );
    let report: RecommendationReport = client.get(&path).await?;

    println!("Optimal:   {} (${:.6})", report.optimal_network, report.estimated_cost_usd);
    if report.fallback {
        println!("           fallback network, no fresh data");
    }
    for alt in &report.alternatives {
        println!(
            "  alt:     {:<10} ${:.6}  {}  reliability {:.2}",
            alt.network,
            alt.estimated_cost_usd,
            alt.speed_class.as_str(),
            alt.reliability
        );
    }
    println!(
        "Savings:   ${:.6} ({:.1}%)",
        report.estimated_savings_usd, report.estimated_savings_percent
    );
    println!();
    println!("{}", report.recommendation);
    Ok(())
}
