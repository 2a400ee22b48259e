use std::path::PathBuf;

use clap::Subcommand;

use super::{fmt_days, fmt_tokens, CliResult, Context};

#[derive(Subcommand)]
pub enum DataAction {
    /// Export the record as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a previously exported record
    Import {
        /// JSON file to read
        file: PathBuf,
    },
    /// Reset all progress (settings are kept)
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run(ctx: &Context, action: DataAction) -> CliResult {
    let service = ctx.service().await;

    match action {
        DataAction::Export { output } => {
            let document = service.export()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, document)?;
                    eprintln!("exported to {}", path.display());
                }
                None => println!("{document}"),
            }
        }
        DataAction::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let record = service.import(&text)?;
            if ctx.json {
                return ctx.print_json(&record);
            }
            println!(
                "Imported: {} streak, {} check-ins, {} tokens",
                fmt_days(record.current_streak),
                record.total_check_ins,
                fmt_tokens(record.tokens)
            );
        }
        DataAction::Reset { yes } => {
            if !yes {
                return Err("reset deletes all progress; pass --yes to confirm".into());
            }
            let record = service.reset()?;
            if ctx.json {
                return ctx.print_json(&record);
            }
            println!("All progress has been reset.");
        }
    }
    Ok(())
}
