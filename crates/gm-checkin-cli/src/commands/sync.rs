use super::{fmt_days, fmt_tokens, CliResult, Context};

pub async fn run(ctx: &Context) -> CliResult {
    let service = ctx.service().await;
    let merged = service.sync().await?;

    if ctx.json {
        return ctx.print_json(&merged);
    }

    match merged {
        Some(record) => {
            println!("Synced from {}", service.source().kind());
            println!("Current streak: {}", fmt_days(record.current_streak));
            println!("Total check-ins: {}", record.total_check_ins);
            println!("Tokens: {}", fmt_tokens(record.tokens));
        }
        None => println!("{} source keeps no remote stats", service.source().kind()),
    }
    Ok(())
}
