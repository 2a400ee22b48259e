//! Subcommand handlers and the shared service wiring.

pub mod checkin;
pub mod config;
pub mod data;
pub mod history;
pub mod identity;
pub mod settings;
pub mod status;
pub mod sync;
pub mod wallet;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use gm_checkin_core::sources::{FarcasterClient, FarcasterSource, HttpLedger, OnChainSource};
use gm_checkin_core::{
    CheckInService, Config, KvStore, LocalSource, MemoryStore, SqliteStore, StatSource,
};
use serde::Serialize;

pub use gm_checkin_core::history::format_tokens as fmt_tokens;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceChoice {
    Local,
    Farcaster,
    Onchain,
}

/// Per-invocation state handed to every command.
pub struct Context {
    pub config: Config,
    pub json: bool,
    pub source: Option<SourceChoice>,
    pub now: DateTime<Utc>,
}

impl Context {
    /// Explicit `--source`, else the first enabled source in config.
    pub fn source_choice(&self) -> SourceChoice {
        self.source.unwrap_or(if self.config.ledger.enabled {
            SourceChoice::Onchain
        } else if self.config.farcaster.enabled {
            SourceChoice::Farcaster
        } else {
            SourceChoice::Local
        })
    }

    pub fn farcaster_client(&self) -> FarcasterClient {
        FarcasterClient::new(self.config.farcaster.api_base.clone())
    }

    pub async fn onchain_source(
        &self,
    ) -> Result<OnChainSource<HttpLedger>, Box<dyn std::error::Error>> {
        let ledger = &self.config.ledger;
        if ledger.relay_url.is_empty() {
            return Err("ledger.relay_url is not configured".into());
        }
        Ok(OnChainSource::connect(
            HttpLedger::new(ledger.relay_url.clone()),
            ledger.address.as_deref(),
            ledger.explorer_url.clone(),
        )
        .await)
    }

    async fn stat_source(&self) -> Box<dyn StatSource> {
        match self.source_choice() {
            SourceChoice::Local => Box::new(LocalSource),
            SourceChoice::Farcaster => {
                let token = self.config.farcaster.token.as_deref();
                Box::new(FarcasterSource::resolve(&self.farcaster_client(), token).await)
            }
            SourceChoice::Onchain => match self.onchain_source().await {
                Ok(source) => Box::new(source),
                Err(err) => {
                    tracing::warn!(error = %err, "on-chain source unavailable, using local record");
                    Box::new(LocalSource)
                }
            },
        }
    }

    /// Build the service. An unavailable durable store degrades to an
    /// in-memory one for this invocation.
    pub async fn service(&self) -> CheckInService<Box<dyn KvStore>> {
        let store: Box<dyn KvStore> = match SqliteStore::open() {
            Ok(store) => Box::new(store),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "durable store unavailable, changes will not be saved"
                );
                Box::new(MemoryStore::new())
            }
        };
        let source = self.stat_source().await;
        CheckInService::new(store, source, self.config.calendar.timezone)
    }

    /// Print `value` as pretty JSON.
    pub fn print_json<T: Serialize>(&self, value: &T) -> CliResult {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

pub fn fmt_days(n: u32) -> String {
    format!("{n} {}", if n == 1 { "day" } else { "days" })
}
