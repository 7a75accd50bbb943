//! `chain-cli`: diagnostics for the target network and the registry contract.

use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::utils::format_units;
use alloy::primitives::Address;
use clap::{Parser, Subcommand};

use username_pay::blockchain::{BlockchainClient, LocalWallet};
use username_pay::config::load_or_default;
use username_pay::contracts::CONTRACT_SOURCE;
use username_pay::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "chain-cli")]
#[command(about = "Network and contract diagnostics for username-pay", long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults target Arc Testnet)
    #[arg(short, long, env = "USERNAME_PAY_CONFIG")]
    config: Option<PathBuf>,

    /// Per-request RPC timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether contract code exists at an address
    CheckContract {
        /// Defaults to the configured registry address
        #[arg(short, long)]
        address: Option<Address>,
    },
    /// Check the node's chain id, then show gas price and the latest block
    Inspect,
    /// Print the registry source and deployment steps
    DeployGuide,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    init_logging(&config.observability);

    let client = BlockchainClient::new(
        config.network.clone(),
        Duration::from_secs(cli.timeout_secs),
    )?;

    match cli.command {
        Commands::CheckContract { address } => {
            let address = address.unwrap_or(config.contracts.payment_address);
            println!(
                "Checking code at {address} on {}...",
                config.network.primary_rpc().unwrap_or_default()
            );
            let code = client.get_code_at(address).await?;
            if code.is_empty() {
                println!("No code found at this address. Contract is NOT deployed on this chain.");
            } else {
                println!("Code found! Contract is deployed.");
                println!("Code length: {} bytes", code.len());
            }
        }
        Commands::Inspect => {
            println!(
                "Expected chain: {} ({})",
                config.network.chain_id,
                config.network.chain_id.to_hex()
            );
            let chain_id = client.verify_chain_id().await?;
            println!("Node chain: {chain_id} (matches)");

            let gas_price = client.get_gas_price().await?;
            println!("Current gas price: {} gwei", format_units(gas_price, "gwei")?);
            println!("   Raw: {gas_price}");

            let block = client.latest_block().await?;
            println!("Latest block: {}", block.number);
            println!("   Gas limit: {}", block.gas_limit);
            if let Some(base_fee) = block.base_fee_per_gas {
                println!("   Base fee: {} gwei", format_units(base_fee, "gwei")?);
            }
        }
        Commands::DeployGuide => {
            println!("{CONTRACT_SOURCE}");
            println!("Contract ready for deployment. Please use Remix IDE to deploy:");
            println!("1. Visit https://remix.ethereum.org");
            println!("2. Create a new file and paste the contract above");
            println!("3. Compile with Solidity 0.8.20+");
            println!("4. Deploy to {} with your wallet", config.network.name);
            println!("5. Set contracts.payment_address in the config to the new address");

            let key_env = &config.wallet.private_key_env;
            let Some(deployer) = LocalWallet::from_env(key_env, config.network.clone())? else {
                println!("\nSet {key_env} to check the deployer balance.");
                return Ok(());
            };
            let balance = client.get_balance(deployer.address()).await?;
            let currency = &config.network.native_currency;

            println!("\nDeployer address: {}", deployer.address());
            println!(
                "Balance: {} {}",
                format_units(balance, currency.decimals)?,
                currency.symbol
            );
            if balance.is_zero() {
                return Err(format!(
                    "No {} balance; fund the deployer before deploying",
                    currency.symbol
                )
                .into());
            }
        }
    }

    Ok(())
}
