//! # Lab Indicators
//!
//! Bibliometric indicators of a research laboratory, and reconciliation of
//! the journal rankings published by Scimago and Web of Science.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (organizations, memberships, journals, publications)
//! - [`sources`]: Access to the laboratory data through the [`LabDataSource`] trait
//! - [`indicators`]: Memoized indicators, their reference periods and registry
//! - [`ranking`]: Scimago and WoS ranking tables, and journal ranking updates
//! - [`utils`]: HTTP client
//! - [`config`]: Configuration management

pub mod config;
pub mod indicators;
pub mod models;
pub mod ranking;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use indicators::{Indicator, IndicatorRegistry, IndicatorSnapshot, IndicatorValue};
pub use sources::{InMemoryLabData, LabDataSource, LabDataset};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
