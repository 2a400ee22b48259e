use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use gm_checkin_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{Context, SourceChoice};

#[derive(Parser)]
#[command(name = "gm-checkin", version, about = "Daily GM check-in tracker")]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Source of truth (defaults to the first enabled one in config)
    #[arg(long, global = true, value_enum)]
    source: Option<SourceChoice>,

    /// Pretend the current time is this RFC 3339 instant
    #[arg(long, global = true, hide = true)]
    at: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check in for today
    Checkin,
    /// Show today's status and streak
    Status,
    /// Calendar of past check-ins
    History(commands::history::HistoryArgs),
    /// Milestone progress
    Milestones,
    /// Print a shareable progress message
    Share,
    /// Pull stats from the configured source
    Sync,
    /// Show the signed-in Farcaster identity
    Identity,
    /// Wallet and ledger operations
    Wallet {
        #[command(subcommand)]
        action: commands::wallet::WalletAction,
    },
    /// Export, import or reset the record
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Record settings (notifications, reminder time, timezone, ...)
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);

    let ctx = Context {
        config,
        json: cli.json,
        source: cli.source,
        now: cli.at.unwrap_or_else(Utc::now),
    };

    let result = match cli.command {
        Commands::Checkin => commands::checkin::run(&ctx).await,
        Commands::Status => commands::status::run(&ctx).await,
        Commands::History(args) => commands::history::run(&ctx, args).await,
        Commands::Milestones => commands::status::milestones(&ctx).await,
        Commands::Share => commands::status::share(&ctx).await,
        Commands::Sync => commands::sync::run(&ctx).await,
        Commands::Identity => commands::identity::run(&ctx).await,
        Commands::Wallet { action } => commands::wallet::run(&ctx, action).await,
        Commands::Data { action } => commands::data::run(&ctx, action).await,
        Commands::Settings { action } => commands::settings::run(&ctx, action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "gm-checkin",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
