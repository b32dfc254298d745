//! # Newswire
//!
//! Ingests news articles from a paginated feed API, persists new ones, and
//! periodically reconciles stored articles against the live feed.
//!
//! ## Architecture
//!
//! ```text
//! FeedClient → Normalizer → DedupGate → Store
//!                  ↑
//!              SyncEngine (pagination loop, run statistics)
//! ```
//!
//! - [`feed`]: paginated HTTP access to the upstream provider
//! - [`normalizer`]: raw provider records → canonical [`domain::Article`]
//! - [`dedup`]: New / Unchanged / Changed classification
//! - [`sync`]: the pagination-driven ingest and resync loops
//! - [`store`]: SQLite persistence behind the `ArticleStore` trait
//!
//! ## Quick Start
//!
//! ```bash
//! # Ingest new headlines
//! newswire fetch --category technology --lang en
//!
//! # Reconcile stored articles against the live feed
//! newswire resync
//!
//! # Browse what is stored
//! newswire list --limit 20
//! ```

/// Application context and error handling.
pub mod app;

/// Read-through cache used by the list surface.
pub mod cache;

/// Command-line interface using clap.
pub mod cli;

/// Configuration management (`~/.config/newswire/config.toml`).
pub mod config;

/// Background daemon for periodic resync runs.
pub mod daemon;

/// Change classification between stored and freshly fetched articles.
pub mod dedup;

/// Core domain models ([`domain::Article`], [`domain::ArticleView`]).
pub mod domain;

/// Paginated feed client for the upstream news provider.
pub mod feed;

/// Raw record validation and normalization.
pub mod normalizer;

/// Read-side use cases for listing and single-article lookup.
pub mod readmodel;

/// SQLite persistence layer.
pub mod store;

/// The ingestion and synchronization engine.
pub mod sync;
