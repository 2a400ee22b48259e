use gm_checkin_core::history::achievement_message;

use super::{fmt_days, fmt_tokens, CliResult, Context};

pub async fn run(ctx: &Context) -> CliResult {
    let service = ctx.service().await;
    let report = service.check_in(ctx.now).await?;

    if ctx.json {
        return ctx.print_json(&report);
    }

    let outcome = &report.outcome;
    match &outcome.milestone {
        Some(label) => println!("🎉 {label}"),
        None => println!("GM! Check-in successful!"),
    }
    println!("Earned {} tokens", fmt_tokens(outcome.reward));
    println!("Streak: {}", fmt_days(outcome.new_streak));
    println!("Balance: {} tokens", fmt_tokens(report.record.tokens));
    if outcome.milestone.is_some() {
        println!("{}", achievement_message(outcome.new_streak));
    }
    if let Some(receipt) = &report.receipt {
        match &receipt.explorer_url {
            Some(url) => println!("Transaction: {url}"),
            None => println!("Transaction: {}", receipt.tx_hash),
        }
    }
    if !report.persisted {
        eprintln!("warning: check-in could not be saved");
    }
    Ok(())
}
