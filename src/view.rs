//! Plain-text rendering of the dashboard

use crate::dashboard::{ConnectionStatus, Dashboard};
use crate::wallet::Eip1193Provider;
use std::fmt::Write;

/// Progress indicator for an in-flight connect or transfer
///
/// Takes the values published on [`Dashboard::subscribe_connection`] and
/// [`Dashboard::subscribe_transferring`].
pub fn progress_line(status: ConnectionStatus, transferring: bool) -> Option<&'static str> {
    if status == ConnectionStatus::Connecting {
        Some("Connecting...")
    } else if transferring {
        Some("Transferring...")
    } else {
        None
    }
}

/// Render the dashboard as the page would show it
pub fn render<P: Eip1193Provider>(dashboard: &Dashboard<P>) -> String {
    let mut out = String::new();
    // Writing to a String never fails
    let _ = write_page(&mut out, dashboard);
    out
}

fn write_page<P: Eip1193Provider>(out: &mut String, dashboard: &Dashboard<P>) -> std::fmt::Result {
    writeln!(out, "{}", dashboard.title())?;
    writeln!(out)?;

    if let Some(error) = dashboard.error_message() {
        writeln!(out, "⚠ {}", error)?;
        writeln!(out)?;
    }

    let Some(account) = dashboard.account() else {
        writeln!(out, "No wallet connected.")?;
        match progress_line(dashboard.status(), false) {
            Some(line) => writeln!(out, "{}", line)?,
            None => writeln!(out, "Connect your wallet to view token data.")?,
        }
        return Ok(());
    };

    let token = dashboard.token();
    writeln!(out, "Account:      {}", account)?;
    writeln!(out, "Network:      {} ({})", dashboard.chain().name, dashboard.chain().id)?;
    writeln!(out, "Token:        {}", token.name)?;
    writeln!(out, "Symbol:       {}", token.symbol)?;
    writeln!(out, "Total supply: {} {}", token.total_supply, token.symbol)?;
    writeln!(out, "Balance:      {} {}", token.balance, token.symbol)?;

    writeln!(out)?;
    writeln!(out, "Send Tokens")?;
    if let Some(line) = progress_line(dashboard.status(), dashboard.is_transferring()) {
        writeln!(out, "{}", line)?;
    }
    if let Some(message) = dashboard.transfer_message() {
        writeln!(out, "{}", message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChainConfig, ChainId};
    use crate::wallet::scripted::{ScriptedWallet, ALICE, BOB, TOKEN};

    fn dashboard() -> Dashboard<ScriptedWallet> {
        let chain = ChainConfig::hardhat().with_token_address(TOKEN.parse().unwrap());
        Dashboard::new(chain, Some(ScriptedWallet::on_chain(ChainId(31337))))
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(
            progress_line(ConnectionStatus::Connecting, false),
            Some("Connecting...")
        );
        assert_eq!(progress_line(ConnectionStatus::Disconnected, true), Some("Transferring..."));
        assert_eq!(progress_line(ConnectionStatus::Disconnected, false), None);
    }

    #[test]
    fn test_render_disconnected() {
        let page = render(&dashboard());
        assert!(page.starts_with("💼 Token Wallet\n"));
        assert!(page.contains("No wallet connected."));
        assert!(page.contains("Connect your wallet"));
        assert!(!page.contains("Send Tokens"));
    }

    #[test]
    fn test_render_no_wallet_error() {
        let mut dashboard: Dashboard<ScriptedWallet> = Dashboard::new(ChainConfig::hardhat(), None);
        tokio_test::block_on(async {
            let _ = dashboard.connect().await;
        });
        let page = render(&dashboard);
        assert!(page.contains("Please install or enable MetaMask."));
        assert!(page.contains("No wallet connected."));
    }

    #[tokio::test]
    async fn test_render_connected() {
        let mut dashboard = dashboard();
        dashboard.connect().await.unwrap();
        dashboard.transfer(BOB, "1").await.unwrap();

        let page = render(&dashboard);
        assert!(page.starts_with("📊 My Dashboard\n"));
        assert!(page.contains(ALICE));
        assert!(page.contains("Network:      Hardhat (31337)"));
        assert!(page.contains("Token:        Dashboard Token"));
        assert!(page.contains("Total supply: 1000000.0 DASH"));
        assert!(page.contains("Balance:      99.0 DASH"));
        assert!(page.contains("Send Tokens"));
        assert!(page.contains("Transfer successful! Tx Hash: 0x4242"));
        assert!(!page.contains("No wallet connected."));
    }
}
