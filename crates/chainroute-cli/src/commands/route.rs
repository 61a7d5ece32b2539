//! `chainroute route` — Route a payment and print the decision.

use chainroute_routing::{CustomerPreferences, RoutingDecision};
use clap::Args;
use serde::Serialize;

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Payment amount.
    #[arg(short, long)]
    pub amount: f64,

    /// Payment currency (USDC, USDT, DAI, ETH, MATIC, BNB).
    #[arg(short, long, default_value = "USDC")]
    pub currency: String,

    /// Urgency (low, normal, high).
    #[arg(short, long)]
    pub urgency: Option<String>,

    /// Merchant whose stored preferences apply.
    #[arg(short, long)]
    pub merchant: Option<String>,

    /// Customer network override.
    #[arg(short, long)]
    pub network: Option<String>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct OptimalRoutingRequest {
    amount: f64,
    currency: String,
    urgency: Option<String>,
    merchant_id: Option<String>,
    customer_preferences: Option<CustomerPreferences>,
}

pub async fn run(args: &RouteArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.endpoint);
    let body = OptimalRoutingRequest {
        amount: args.amount,
        currency: args.currency.clone(),
        urgency: args.urgency.clone(),
        merchant_id: args.merchant.clone(),
        customer_preferences: args.network.clone().map(|network| CustomerPreferences {
            network: Some(network),
        }),
    };
    let decision: RoutingDecision = client.post("/routing/optimal", &body).await?;

    println!("Routing ID:    {}", decision.routing_id);
    println!("Network:       {}", decision.selected_network);
    println!("Reason:        {}", decision.selection_reason);
    if decision.fallback {
        println!("Fallback:      yes (no fresh network data)");
    }
    println!("Est. fee:      ${:.6}", decision.estimated_cost_usd);
    println!(
        "Savings:       ${:.6} ({:.1}%)",
        decision.estimated_savings_usd, decision.estimated_savings_percent
    );
    if !decision.alternative_networks.is_empty() {
        println!("Alternatives:  {}", decision.alternative_networks.join(", "));
    }
    println!();
    println!("{}", decision.recommendation);
    Ok(())
}
