//! # Code Snapshot
//!
//! Snapshot a codebase into a SQLite content store and resolve files back by
//! relative path.
//!
//! Code Snapshot walks a directory tree, drops paths that match glob-style
//! exclusion rules, and stores the text of every surviving file exactly once,
//! keyed by its path relative to the root. A companion lookup resolves a set
//! of relative paths back to their contents, reporting the ones it does not
//! have instead of failing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Tree Walker │──▶│  Ingestion  │──▶│  SQLite  │
//! │ + Excludes  │   │   Engine    │   │  files   │
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │  (snap)  │       │ resolve  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! snap init                        # create database
//! snap ingest --root ./my-project  # snapshot a tree
//! snap get src/main.py src/app.py  # read files back
//! snap serve                       # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`walker`] | Directory traversal with pruning |
//! | [`ingest`] | Ingestion engine and `snap ingest` |
//! | [`get`] | Retrieval and `snap get` |
//! | [`server`] | HTTP retrieval server |
//! | [`sqlite_store`] | SQLite [`FileStore`](code_snapshot_core::store::FileStore) |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod progress;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod walker;
