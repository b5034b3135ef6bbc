//! # Patchwatch
//!
//! A changelog classification, alerting, and synchronization pipeline for
//! tracked database products.
//!
//! Patchwatch ingests harvested changelog JSON, classifies each change
//! against a keyword taxonomy, derives security and performance alerts,
//! tags innovation themes, aggregates the results per version hierarchy,
//! and incrementally synchronizes new patches into a local SQLite store.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────────────────────┐   ┌──────────┐
//! │ Harvester │──▶│  Pipeline                  │──▶│  SQLite   │
//! │  *.json   │   │ Normalize+Classify+Alert  │   │  store    │
//! └───────────┘   └───────────────────────────┘   └────┬─────┘
//!                                                      │
//!                                                      ▼
//!                                                 ┌──────────┐
//!                                                 │   CLI    │
//!                                                 │ (pwatch) │
//!                                                 └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pwatch init                   # create the store
//! pwatch run ./sources          # ingest a harvest directory
//! pwatch stats                  # aggregated overview
//! pwatch show Redis             # per-release breakdown
//! pwatch check                  # integrity scan
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`taxonomy`] | Keyword taxonomies for classification, alerts, themes |
//! | [`normalize`] | Raw record validation and canonicalization |
//! | [`classify`] | Per-change category classification |
//! | [`alerts`] | Alert derivation and severity assessment |
//! | [`innovation`] | Innovation theme tagging and trend analysis |
//! | [`aggregate`] | Hierarchical roll-ups (patch to global) |
//! | [`catalog`] | Product classification metadata |
//! | [`sync`] | Incremental dedup-safe synchronization |
//! | [`pipeline`] | End-to-end ingestion run |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod aggregate;
pub mod alerts;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod innovation;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sqlite_store;
pub mod stats;
pub mod store;
pub mod sync;
pub mod taxonomy;
