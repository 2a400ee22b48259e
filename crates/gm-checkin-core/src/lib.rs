//! # GM Check-in Core Library
//!
//! Core logic for a once-a-day "GM" check-in habit tracker. The CLI binary is
//! a thin layer over this library; everything it shows comes from here.
//!
//! ## Architecture
//!
//! - **Tracker**: pure streak and reward calculation over a `CheckInRecord`
//! - **Storage**: SQLite key-value persistence and TOML configuration
//! - **Sources**: optional sources of truth (Farcaster identity, on-chain
//!   ledger) behind one `StatSource` trait, with local computation as the
//!   fallback
//! - **Service**: load, mutate, save around the tracker
//!
//! ## Key Components
//!
//! - [`StreakTracker`]: eligibility, check-in, import and reset
//! - [`CheckInRecord`]: the persisted record
//! - [`CheckInService`]: the tracker bound to a store and a source
//! - [`Config`]: application configuration management

pub mod day;
pub mod error;
pub mod history;
pub mod record;
pub mod rewards;
pub mod service;
pub mod sources;
pub mod storage;
pub mod tracker;

pub use day::DayBoundary;
pub use error::{CheckInError, ConfigError, CoreError, ImportError, SourceError, StorageError};
pub use record::{CheckInRecord, Settings};
pub use rewards::{Milestone, BASE_REWARD, MILESTONES};
pub use service::{CheckInReport, CheckInService, StatusReport};
pub use sources::{LocalSource, SourceKind, StatSource};
pub use storage::{Config, KvStore, MemoryStore, RecordStore, SqliteStore};
pub use tracker::{CheckInOutcome, DayStatus, StreakTracker};
