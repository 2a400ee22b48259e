//! Sources of truth for a check-in record.
//!
//! Local computation is always possible. Farcaster adds an identity (and
//! with it a per-user storage scope); an on-chain ledger additionally holds
//! its own copy of the stats and receives each check-in. Every source is a
//! capability that may be absent, checked through [`StatSource::is_available`].

pub mod farcaster;
pub mod onchain;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SourceError;
use crate::record::CheckInRecord;
use crate::tracker::CheckInOutcome;

pub use farcaster::{FarcasterClient, FarcasterIdentity, FarcasterSource};
pub use onchain::{HttpLedger, Ledger, LedgerStats, OnChainSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Farcaster,
    OnChain,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceKind::Local => "local",
            SourceKind::Farcaster => "farcaster",
            SourceKind::OnChain => "onchain",
        };
        f.write_str(name)
    }
}

/// Stats held by a remote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStats {
    pub current_streak: u32,
    pub total_check_ins: u32,
    pub tokens: f64,
    pub last_check_in: Option<DateTime<Utc>>,
}

impl RemoteStats {
    /// Overlay remote stats on `record`. History and settings stay local.
    ///
    /// `last_check_in` only moves forward: a remote side that has not seen
    /// the latest local check-in must not make that day eligible again.
    pub fn apply_to(&self, record: &CheckInRecord) -> CheckInRecord {
        let mut merged = record.clone();
        merged.current_streak = self.current_streak;
        merged.total_check_ins = self.total_check_ins;
        merged.tokens = self.tokens;
        merged.last_check_in = match (record.last_check_in, self.last_check_in) {
            (Some(local), Some(remote)) => Some(local.max(remote)),
            (local, remote) => local.or(remote),
        };
        merged.repair();
        merged
    }
}

/// Proof that a remote source accepted a check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: String,
    pub explorer_url: Option<String>,
}

#[async_trait]
pub trait StatSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Whether the backing platform is present and usable right now.
    fn is_available(&self) -> bool;

    /// Storage scope of the record this source reads and writes.
    fn scope(&self) -> Option<String> {
        None
    }

    /// Stats held remotely, if this source keeps any.
    async fn fetch_stats(&self) -> Result<Option<RemoteStats>, SourceError> {
        Ok(None)
    }

    /// Forward a local check-in. Sources that do not settle anything
    /// remotely return `Ok(None)`.
    async fn submit_check_in(
        &self,
        _outcome: &CheckInOutcome,
    ) -> Result<Option<Receipt>, SourceError> {
        Ok(None)
    }
}

/// Device-local computation only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSource;

#[async_trait]
impl StatSource for LocalSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Join `path` onto `base`, treating `base` as a directory.
pub(crate) fn endpoint(base: &str, path: &str) -> Result<Url, SourceError> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn endpoint_keeps_base_path() {
        assert_eq!(
            endpoint("https://relay.example/gm", "/v1/connect").unwrap().as_str(),
            "https://relay.example/gm/v1/connect"
        );
        assert_eq!(
            endpoint("http://localhost:8000/", "api/me").unwrap().as_str(),
            "http://localhost:8000/api/me"
        );
        assert!(endpoint("not a url", "api/me").is_err());
    }

    #[test]
    fn remote_stats_overlay_repairs_best_streak() {
        let record = CheckInRecord {
            best_streak: 2,
            check_in_history: vec!["2024-01-01".into()],
            ..CheckInRecord::default()
        };
        let stats = RemoteStats {
            current_streak: 5,
            total_check_ins: 12,
            tokens: 140.0,
            last_check_in: Some(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()),
        };
        let merged = stats.apply_to(&record);
        assert_eq!(merged.current_streak, 5);
        assert_eq!(merged.best_streak, 5);
        assert_eq!(merged.total_check_ins, 12);
        assert_eq!(merged.tokens, 140.0);
        assert_eq!(merged.check_in_history, record.check_in_history);
    }

    #[test]
    fn remote_stats_without_timestamp_keep_local_one() {
        let last = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let record = CheckInRecord {
            last_check_in: Some(last),
            ..CheckInRecord::default()
        };
        let stats = RemoteStats {
            current_streak: 0,
            total_check_ins: 0,
            tokens: 0.0,
            last_check_in: None,
        };
        assert_eq!(stats.apply_to(&record).last_check_in, Some(last));
    }

    #[test]
    fn stale_remote_timestamp_never_rewinds_last_check_in() {
        let local = Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();
        let remote = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let record = CheckInRecord {
            last_check_in: Some(local),
            ..CheckInRecord::default()
        };
        let stale = RemoteStats {
            current_streak: 1,
            total_check_ins: 1,
            tokens: 10.0,
            last_check_in: Some(remote),
        };
        assert_eq!(stale.apply_to(&record).last_check_in, Some(local));

        let fresh = RemoteStats {
            last_check_in: Some(local + chrono::Duration::days(1)),
            ..stale
        };
        assert_eq!(
            fresh.apply_to(&record).last_check_in,
            Some(local + chrono::Duration::days(1))
        );
    }

    #[tokio::test]
    async fn local_source_has_no_remote_side() {
        let source = LocalSource;
        assert!(source.is_available());
        assert_eq!(source.scope(), None);
        assert_eq!(source.fetch_stats().await.unwrap(), None);
    }
}
