//! `chainroute init` — Write a starter node configuration.

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory).
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

/// Only the commonly tuned settings; the node fills in the built-in network
/// catalog and every other default.
const STARTER_CONFIG: &str = r#"# Chainroute Node Configuration

[monitor]
# "rpc" queries each network's rpc_endpoint, "fixed" uses [fixed_gas_prices].
fee_source = "rpc"
update_interval_ms = 30000
poll_timeout_ms = 8000
rpc_request_timeout_ms = 5000

[routing]
decision_log_capacity = 1000
expensive_networks = ["ethereum"]

[api]
listen_addr = "127.0.0.1"
port = 9300

[logging]
level = "info"
format = "text"

# Native token prices in USD.
[prices]
ETH = 3000.0
MATIC = 0.7
BNB = 600.0

# Gas prices in gwei for fee_source = "fixed".
[fixed_gas_prices]
ethereum = 25.0
polygon = 40.0
arbitrum = 0.1
optimism = 0.05
base = 0.05
bsc = 3.0

[catalog]
fallback_network = "polygon"
"#;

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    let config_path = args.dir.join("chainroute.toml");

    if config_path.exists() {
        anyhow::bail!("configuration file already exists at {}", config_path.display());
    }

    std::fs::create_dir_all(&args.dir)?;
    std::fs::write(&config_path, STARTER_CONFIG)?;

    println!("Initialized Chainroute node config at {}", config_path.display());
    println!("Edit chainroute.toml to customize prices, fee source and networks.");
    println!("Run 'chainroute-node --config {}' to start the node.", config_path.display());
    Ok(())
}
