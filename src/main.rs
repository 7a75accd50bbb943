//! `username-pay`: register a username and pay other users by theirs.
//!
//! The signing key is read from the environment variable named in the
//! config (`USERNAME_PAY_PRIVATE_KEY` by default). Progress is reported
//! through the log; results are printed to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};

use username_pay::config::load_or_default;
use username_pay::observability::logging::init_logging;
use username_pay::payments::{PaymentRequest, PaymentState};
use username_pay::status::TracingReporter;
use username_pay::transactions::TransactionOutcome;
use username_pay::UsernamePayApp;

#[derive(Parser)]
#[command(name = "username-pay")]
#[command(about = "Pay stablecoins by username", long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults target Arc Testnet)
    #[arg(short, long, env = "USERNAME_PAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect the wallet and show the account and its username
    Connect,
    /// Register a username for the connected account
    Register { username: String },
    /// Pay a registered user
    Pay {
        recipient: String,
        amount: String,
        #[arg(short, long, default_value = "")]
        message: String,
    },
    /// Address registered for a username
    Lookup { username: String },
    /// Username registered by an address
    Whois { address: Address },
    /// Whether a username is still free
    Available { username: String },
    /// Token balance of the connected account
    Balance,
    /// Stay connected and follow wallet changes until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!(
        network = %config.network.name,
        chain_id = %config.network.chain_id,
        contract = %config.contracts.payment_address,
        "Configuration loaded"
    );

    let mut app = UsernamePayApp::from_config(config, Arc::new(TracingReporter))?;
    app.connect().await?;

    match cli.command {
        Commands::Connect => {
            if let Some(session) = app.session() {
                println!("{} on chain {}", session.account(), session.chain_id());
            }
            println!("{}", app.username_display());
        }
        Commands::Register { username } => {
            let outcome = app.register(&username).await?;
            println!("{}", outcome.describe());
            match outcome.into_result() {
                Ok(_) => println!("{}", app.username_display()),
                // Unknown, not failed: the explorer link was already printed.
                Err(e) if e.is_pending() => {}
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Pay {
            recipient,
            amount,
            message,
        } => {
            let request = PaymentRequest::new(recipient, amount).with_message(message);
            let report = app.pay(&request).await;
            println!("{}", report.message);
            match report.state {
                PaymentState::Done => {
                    if let Some(TransactionOutcome::Confirmed(receipt)) = &report.outcome {
                        println!("{}", app.submitter().explorer_url(&receipt.tx_hash));
                    }
                }
                PaymentState::Unconfirmed => {}
                _ => return Err(report.message.into()),
            }
        }
        Commands::Lookup { username } => match app.lookup_address(&username).await? {
            Some(address) => println!("@{} → {address}", username.trim()),
            None => println!("@{} is not registered", username.trim()),
        },
        Commands::Whois { address } => match app.lookup_username(address).await? {
            Some(username) => println!("{address} → @{username}"),
            None => println!("{address} has no username"),
        },
        Commands::Available { username } => {
            let free = app.is_available(&username).await?;
            println!(
                "@{} is {}",
                username.trim(),
                if free { "available" } else { "taken" }
            );
        }
        Commands::Balance => {
            let balance = app.token_balance().await?;
            println!("{balance} {}", app.config().contracts.token_symbol);
        }
        Commands::Watch => {
            println!("Connected as {}; watching wallet (Ctrl-C to stop)", app.username_display());
            app.run_events(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                }
            })
            .await?;
        }
    }

    Ok(())
}
