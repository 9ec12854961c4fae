//! Interactive CLI for the token dashboard
//!
//! Run with: cargo run --example interactive
//!
//! Uses PRIVATE_KEY for an in-process wallet, or TOKEN_DASHBOARD_WALLET_URL
//! to talk to a JSON-RPC endpoint that exposes wallet methods.

use std::future::Future;
use std::io::{self, Write};

use tokio::sync::watch;
use token_dashboard::{
    parse_recipient, progress_line, render, ChainConfig, ConnectionStatus, Dashboard,
    Eip1193Provider, JsonRpcBridge, LocalWallet, TokenClient,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = ChainConfig::from_env()?;

    println!("\n========================================");
    println!("     Token Dashboard Interactive CLI");
    println!("========================================");
    println!("Network: {} (chain ID {})", config.name, config.id);
    match config.token_address {
        Some(token) => println!("Token:   {}", token),
        None => println!("Token:   not configured"),
    }

    if let Ok(private_key) = std::env::var("PRIVATE_KEY") {
        let wallet = LocalWallet::from_private_key(&private_key, &config)?;
        println!("Wallet:  local key {}", wallet.address());
        run(Dashboard::new(config, Some(wallet))).await
    } else if let Ok(url) = std::env::var("TOKEN_DASHBOARD_WALLET_URL") {
        println!("Wallet:  JSON-RPC bridge at {}", url);
        let bridge = JsonRpcBridge::new(url)?.with_metamask(true);
        run(Dashboard::new(config, Some(bridge))).await
    } else {
        println!("Wallet:  none (set PRIVATE_KEY or TOKEN_DASHBOARD_WALLET_URL)");
        run(Dashboard::<LocalWallet>::new(config, None)).await
    }
}

async fn run<P: Eip1193Provider>(mut dashboard: Dashboard<P>) -> eyre::Result<()> {
    // Main loop
    loop {
        println!("\n----------------------------------------");
        println!("Select an option:");
        println!("  1. Connect wallet");
        println!("  2. View dashboard");
        println!("  3. Refresh token data");
        println!("  4. Send tokens");
        println!("  5. Check balances");
        println!("  q. Quit");
        println!("----------------------------------------");

        let choice = prompt("Enter choice: ")?;

        // Apply account/chain changes made in the wallet since the last action
        let handled = dashboard.drain_events().await;
        if handled > 0 {
            println!("\nApplied {} wallet event(s)", handled);
        }

        match choice.as_str() {
            "1" => connect_flow(&mut dashboard).await,
            "2" => println!("\n{}", render(&dashboard)),
            "3" => refresh_flow(&mut dashboard).await,
            "4" => send_flow(&mut dashboard).await?,
            "5" => balances_flow(&dashboard).await?,
            "q" | "Q" => {
                println!("\nGoodbye!");
                break;
            }
            _ => println!("\nInvalid choice. Please try again."),
        }
    }

    Ok(())
}

fn prompt(label: &str) -> eyre::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Drive `work` to completion, printing progress published by the dashboard
async fn with_progress<T>(
    work: impl Future<Output = T>,
    mut connection: watch::Receiver<ConnectionStatus>,
    mut transferring: watch::Receiver<bool>,
) -> T {
    tokio::pin!(work);
    loop {
        tokio::select! {
            out = &mut work => return out,
            Ok(()) = connection.changed() => {
                let status = *connection.borrow_and_update();
                if let Some(line) = progress_line(status, false) {
                    println!("{}", line);
                }
            }
            Ok(()) = transferring.changed() => {
                let active = *transferring.borrow_and_update();
                if let Some(line) = progress_line(ConnectionStatus::Disconnected, active) {
                    println!("{}", line);
                }
            }
        }
    }
}

async fn connect_flow<P: Eip1193Provider>(dashboard: &mut Dashboard<P>) {
    println!("\n=== CONNECT ===");

    let connection = dashboard.subscribe_connection();
    let transferring = dashboard.subscribe_transferring();
    match with_progress(dashboard.connect(), connection, transferring).await {
        Ok(account) => println!("Connected: {}", account),
        Err(e) => println!("Connection failed: {:#}", e),
    }
    println!("\n{}", render(dashboard));
}

async fn refresh_flow<P: Eip1193Provider>(dashboard: &mut Dashboard<P>) {
    if !dashboard.is_connected() {
        println!("\nNo wallet connected.");
        return;
    }

    match dashboard.refresh_token_data().await {
        Ok(()) => println!("\n{}", render(dashboard)),
        Err(e) => println!("\nRefresh failed: {:#}", e),
    }
}

async fn send_flow<P: Eip1193Provider>(dashboard: &mut Dashboard<P>) -> eyre::Result<()> {
    println!("\n=== SEND TOKENS ===");

    if let Some(account) = dashboard.account() {
        println!(
            "From {} (balance {} {})",
            account,
            dashboard.token().balance,
            dashboard.token().symbol
        );
    }

    let recipient = prompt("Recipient address: ")?;
    let amount = prompt("Amount: ")?;

    let connection = dashboard.subscribe_connection();
    let transferring = dashboard.subscribe_transferring();
    match with_progress(dashboard.transfer(&recipient, &amount), connection, transferring).await {
        Ok(tx_hash) => println!("Transaction: {}", tx_hash),
        Err(e) => tracing::debug!("transfer error: {:#}", e),
    }

    if let Some(message) = dashboard.transfer_message() {
        println!("{}", message);
    }
    if let Some(error) = dashboard.error_message() {
        println!("{}", error);
    }

    Ok(())
}

/// Balances for a comma-separated list of addresses
async fn balances_flow<P: Eip1193Provider>(dashboard: &Dashboard<P>) -> eyre::Result<()> {
    println!("\n=== BALANCES ===");

    let (Some(provider), Some(token)) = (dashboard.provider(), dashboard.chain().token_address)
    else {
        println!("Needs a wallet and a configured token address.");
        return Ok(());
    };

    let input = prompt("Addresses (comma separated): ")?;
    let mut accounts = Vec::new();
    for raw in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match parse_recipient(raw) {
            Ok(account) => accounts.push(account),
            Err(e) => println!("Skipping {}: {}", raw, e),
        }
    }

    // Fetch all balances in parallel
    let client = TokenClient::new(provider, token);
    let client = &client;
    let futures: Vec<_> = accounts
        .into_iter()
        .map(|account| async move { (account, client.balance_of(account).await) })
        .collect();

    let results = futures::future::join_all(futures).await;

    let symbol = &dashboard.token().symbol;
    for (account, result) in results {
        match result {
            Ok(balance) => println!(
                "{}: {} {}",
                account,
                token_dashboard::format_units(balance, dashboard.decimals()),
                symbol
            ),
            Err(e) => println!("{}: error: {:#}", account, e),
        }
    }

    Ok(())
}
