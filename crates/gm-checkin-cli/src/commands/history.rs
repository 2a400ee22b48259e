use chrono::Datelike;
use clap::Args;
use gm_checkin_core::history::{parse_month, MonthView};

use super::{CliResult, Context};

#[derive(Args)]
pub struct HistoryArgs {
    /// Month to show as YYYY-MM (defaults to the current month)
    #[arg(long)]
    month: Option<String>,

    /// List every check-in date instead of a calendar
    #[arg(long)]
    list: bool,
}

pub async fn run(ctx: &Context, args: HistoryArgs) -> CliResult {
    let service = ctx.service().await;

    if args.list {
        let history = service.record().check_in_history;
        if ctx.json {
            return ctx.print_json(&history);
        }
        for date in history {
            println!("{date}");
        }
        return Ok(());
    }

    let (year, month) = match args.month.as_deref() {
        Some(raw) => parse_month(raw)
            .ok_or_else(|| format!("invalid month '{raw}', expected YYYY-MM"))?,
        None => {
            let today = service
                .tracker_for(&service.record())
                .boundary()
                .date_of(ctx.now);
            (today.year(), today.month())
        }
    };
    let view = service
        .month(year, month, ctx.now)
        .ok_or_else(|| format!("invalid month {year}-{month:02}"))?;

    if ctx.json {
        return ctx.print_json(&view);
    }
    print_calendar(&view);
    Ok(())
}

fn print_calendar(view: &MonthView) {
    println!("{:^28}", format!("{}-{:02}", view.year, view.month));
    println!(" Sun Mon Tue Wed Thu Fri Sat");
    let mut line = "    ".repeat(view.leading_blanks as usize);
    let mut column = view.leading_blanks;
    for day in &view.days {
        let mark = match (day.checked_in, day.today) {
            (true, _) => '*',
            (false, true) => '.',
            _ => ' ',
        };
        line.push_str(&format!("{:>3}{mark}", day.day));
        column += 1;
        if column % 7 == 0 {
            println!("{}", line.trim_end());
            line.clear();
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }
    println!();
    println!("{} check-in(s) this month  (* checked in, . today)", view.checked_in_days);
}
