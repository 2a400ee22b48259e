//! On-chain ledger: check-ins settled through a JSON relay in front of the
//! Base check-in contract.
//!
//! Relay endpoints:
//! - `POST /v1/connect` → `{"address": "0x.."}`
//! - `GET  /v1/accounts/{address}/stats` → `{"currentStreak", "totalCheckIns",
//!   "tokens", "lastCheckIn"}` (`lastCheckIn` in unix seconds, 0 when never)
//! - `POST /v1/accounts/{address}/check-ins` → `{"txHash": "0x.."}`
//! - `GET  /v1/accounts/{address}/balance` → `{"balance": 12.5}`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{endpoint, Receipt, RemoteStats, SourceKind, StatSource};
use crate::error::SourceError;
use crate::tracker::CheckInOutcome;

const SERVICE: &str = "ledger";

/// Stats as the contract stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub current_streak: u32,
    pub total_check_ins: u32,
    pub tokens: f64,
    /// Unix seconds; 0 means never.
    pub last_check_in: i64,
}

impl From<LedgerStats> for RemoteStats {
    fn from(stats: LedgerStats) -> Self {
        let last_check_in = if stats.last_check_in > 0 {
            DateTime::<Utc>::from_timestamp(stats.last_check_in, 0)
        } else {
            None
        };
        RemoteStats {
            current_streak: stats.current_streak,
            total_check_ins: stats.total_check_ins,
            tokens: stats.tokens.max(0.0),
            last_check_in,
        }
    }
}

/// Wallet/ledger capability.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Resolve the wallet address to act for. `preferred` is a configured
    /// address, if any.
    async fn connect(&self, preferred: Option<&str>) -> Result<String, SourceError>;
    async fn get_stats(&self, address: &str) -> Result<LedgerStats, SourceError>;
    /// Returns the transaction hash.
    async fn submit_check_in(&self, address: &str) -> Result<String, SourceError>;
    async fn get_balance(&self, address: &str) -> Result<f64, SourceError>;
}

/// [`Ledger`] backed by the JSON relay.
pub struct HttpLedger {
    client: Client,
    relay_url: String,
}

#[derive(Deserialize)]
struct ConnectResponse {
    address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    tx_hash: String,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: f64,
}

impl HttpLedger {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            relay_url: relay_url.into(),
        }
    }

    async fn read<T: DeserializeOwned>(resp: Response) -> Result<T, SourceError> {
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SourceError::Unauthorized {
                    service: SERVICE.to_string(),
                })
            }
            status if !status.is_success() => {
                return Err(SourceError::Status {
                    service: SERVICE.to_string(),
                    status: status.as_u16(),
                })
            }
            _ => {}
        }
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::InvalidResponse {
            service: SERVICE.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn connect(&self, preferred: Option<&str>) -> Result<String, SourceError> {
        let url = endpoint(&self.relay_url, "v1/connect")?;
        let resp = self
            .client
            .post(url)
            .json(&json!({ "address": preferred }))
            .send()
            .await?;
        let body: ConnectResponse = Self::read(resp).await?;
        Ok(body.address)
    }

    async fn get_stats(&self, address: &str) -> Result<LedgerStats, SourceError> {
        let url = endpoint(&self.relay_url, &format!("v1/accounts/{address}/stats"))?;
        let resp = self.client.get(url).send().await?;
        Self::read(resp).await
    }

    async fn submit_check_in(&self, address: &str) -> Result<String, SourceError> {
        let url = endpoint(&self.relay_url, &format!("v1/accounts/{address}/check-ins"))?;
        let resp = self.client.post(url).send().await?;
        let body: SubmitResponse = Self::read(resp).await?;
        Ok(body.tx_hash)
    }

    async fn get_balance(&self, address: &str) -> Result<f64, SourceError> {
        let url = endpoint(&self.relay_url, &format!("v1/accounts/{address}/balance"))?;
        let resp = self.client.get(url).send().await?;
        let body: BalanceResponse = Self::read(resp).await?;
        Ok(body.balance)
    }
}

/// Ledger-backed source. Unavailable until a wallet address is connected.
pub struct OnChainSource<L> {
    ledger: L,
    address: Option<String>,
    explorer_url: String,
}

impl<L: Ledger> OnChainSource<L> {
    /// Connect to the ledger. A failed connection leaves the source
    /// unavailable rather than failing.
    pub async fn connect(
        ledger: L,
        preferred: Option<&str>,
        explorer_url: impl Into<String>,
    ) -> Self {
        let address = match ledger.connect(preferred).await {
            Ok(address) => {
                tracing::info!(%address, "wallet connected");
                Some(address)
            }
            Err(err) => {
                tracing::warn!(error = %err, "wallet unavailable, using local record");
                None
            }
        };
        Self {
            ledger,
            address,
            explorer_url: explorer_url.into(),
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Explorer link for a transaction.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }

    /// Reward-token balance of the connected wallet.
    ///
    /// # Errors
    /// [`SourceError::Unavailable`] if no wallet is connected, otherwise any
    /// ledger error.
    pub async fn balance(&self) -> Result<f64, SourceError> {
        let address = self.require_address()?;
        self.ledger.get_balance(address).await
    }

    fn require_address(&self) -> Result<&str, SourceError> {
        self.address
            .as_deref()
            .ok_or_else(|| SourceError::Unavailable("wallet".to_string()))
    }
}

#[async_trait]
impl<L: Ledger> StatSource for OnChainSource<L> {
    fn kind(&self) -> SourceKind {
        SourceKind::OnChain
    }

    fn is_available(&self) -> bool {
        self.address.is_some()
    }

    fn scope(&self) -> Option<String> {
        self.address
            .as_ref()
            .map(|a| format!("wallet:{}", a.to_ascii_lowercase()))
    }

    async fn fetch_stats(&self) -> Result<Option<RemoteStats>, SourceError> {
        let address = self.require_address()?;
        let stats = self.ledger.get_stats(address).await?;
        Ok(Some(stats.into()))
    }

    async fn submit_check_in(
        &self,
        outcome: &CheckInOutcome,
    ) -> Result<Option<Receipt>, SourceError> {
        let address = self.require_address()?;
        let tx_hash = self.ledger.submit_check_in(address).await?;
        tracing::info!(%tx_hash, streak = outcome.new_streak, "check-in submitted on-chain");
        Ok(Some(Receipt {
            explorer_url: Some(self.tx_url(&tx_hash)),
            tx_hash,
        }))
    }
}
