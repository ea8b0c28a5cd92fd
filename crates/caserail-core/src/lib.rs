//! caserail Core Library
//!
//! This crate turns test runner assertions into TestRail results:
//! - Case identifier matching and result collection
//! - TestRail API trait and HTTP client
//! - Run synchronization (run creation or reuse, filtering, submission)
//! - Event-driven reporter tying the two together
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Runner    │────▶│   Result    │────▶│     Run     │────▶ TestRail
//! │   events    │     │  Collector  │     │ Synchronizer│
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use caserail_core::{HttpTestRail, Reporter, ReporterConfig, RunnerEvent};
//!
//! let config = ReporterConfig::load("caserail.yaml")?;
//! let mut reporter = Reporter::new(HttpTestRail::new(&config)?, config)?;
//! reporter.handle(RunnerEvent::assertion("Status is 200 (C12)", "Get user", None)).await?;
//! let report = reporter.handle(RunnerEvent::Done).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod reporter;
pub mod results;
pub mod sync;

pub use api::TestRailApi;
pub use client::HttpTestRail;
pub use config::{EmptyFilterPolicy, ReporterConfig};
pub use error::{Error, Result};
pub use events::RunnerEvent;
pub use reporter::Reporter;
pub use results::{CaseResult, CaseStatus, ResultCollector};
pub use sync::{RunSynchronizer, SyncReport};
