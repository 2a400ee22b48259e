use clap::Subcommand;
use serde_json::Value;

use super::{CliResult, Context};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show one record setting
    Get {
        /// Setting key (e.g. "timezone", "reminderTime")
        key: String,
    },
    /// Change a record setting
    Set {
        key: String,
        /// JSON value; anything that does not parse is stored as a string
        value: String,
    },
    /// Show all record settings
    List,
}

pub async fn run(ctx: &Context, action: SettingsAction) -> CliResult {
    let service = ctx.service().await;

    match action {
        SettingsAction::Get { key } => {
            let record = service.record();
            let value = record
                .settings
                .get(&key)
                .ok_or_else(|| format!("unknown setting: {key}"))?;
            match value {
                Value::String(s) => println!("{s}"),
                other => println!("{other}"),
            }
        }
        SettingsAction::Set { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            let record = service.update_setting(&key, value)?;
            if ctx.json {
                return ctx.print_json(&record.settings);
            }
            println!("ok");
        }
        SettingsAction::List => {
            let record = service.record();
            if ctx.json {
                return ctx.print_json(&record.settings);
            }
            for (key, value) in record.settings.iter() {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}
