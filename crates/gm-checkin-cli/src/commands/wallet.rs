use clap::Subcommand;

use super::{fmt_tokens, CliResult, Context};

#[derive(Subcommand)]
pub enum WalletAction {
    /// Connect to the ledger relay and show the wallet address
    Connect,
    /// Show the reward-token balance of the connected wallet
    Balance,
}

pub async fn run(ctx: &Context, action: WalletAction) -> CliResult {
    let source = ctx.onchain_source().await?;
    let address = source
        .address()
        .ok_or("wallet connection failed")?
        .to_string();

    match action {
        WalletAction::Connect => {
            if ctx.json {
                return ctx.print_json(&serde_json::json!({ "address": address }));
            }
            println!("Connected: {address}");
            if ctx.config.ledger.address.as_deref() != Some(address.as_str()) {
                println!("Run `gm-checkin config set ledger.address {address}` to remember it.");
            }
        }
        WalletAction::Balance => {
            let balance = source.balance().await?;
            if ctx.json {
                return ctx.print_json(&serde_json::json!({
                    "address": address,
                    "balance": balance,
                }));
            }
            println!("{address}: {} tokens", fmt_tokens(balance));
        }
    }
    Ok(())
}
