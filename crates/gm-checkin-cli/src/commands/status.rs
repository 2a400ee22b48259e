use gm_checkin_core::history::share_message;
use gm_checkin_core::rewards::milestone_progress;
use gm_checkin_core::DayStatus;

use super::{fmt_days, fmt_tokens, CliResult, Context};

pub async fn run(ctx: &Context) -> CliResult {
    let service = ctx.service().await;
    let report = service.status(ctx.now);

    if ctx.json {
        return ctx.print_json(&report);
    }

    match report.status {
        DayStatus::Eligible => println!("Ready for today's check-in! ({})", report.today),
        DayStatus::CheckedInToday => {
            println!("Already checked in today. Come back tomorrow! ({})", report.today)
        }
    }
    println!("Current streak: {}", fmt_days(report.current_streak));
    println!("Best streak:    {}", fmt_days(report.best_streak));
    println!("Total check-ins: {}", report.total_check_ins);
    println!("Tokens: {}", fmt_tokens(report.tokens));
    if let Some(next) = &report.next_milestone {
        println!(
            "Next milestone: {} ({} to go, +{} tokens)",
            fmt_days(next.days),
            fmt_days(next.days_remaining),
            fmt_tokens(next.bonus)
        );
    }
    println!("Source: {} | Timezone: {}", report.source, report.timezone);
    Ok(())
}

pub async fn milestones(ctx: &Context) -> CliResult {
    let service = ctx.service().await;
    let progress = milestone_progress(service.record().current_streak);

    if ctx.json {
        return ctx.print_json(&progress);
    }

    for m in &progress {
        let mark = if m.reached { "✓" } else { " " };
        println!("[{mark}] {:>3} days  +{:<4} {}", m.days, fmt_tokens(m.bonus), m.label);
    }
    Ok(())
}

pub async fn share(ctx: &Context) -> CliResult {
    let service = ctx.service().await;
    let message = share_message(&service.record());

    if ctx.json {
        return ctx.print_json(&serde_json::json!({ "text": message }));
    }
    println!("{message}");
    Ok(())
}
