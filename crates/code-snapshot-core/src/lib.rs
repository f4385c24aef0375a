//! # Code Snapshot Core
//!
//! Shared logic for Code Snapshot: data models, path canonicalization,
//! exclusion matching, the file store abstraction, and the retrieval
//! algorithm.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Everything here
//! operates on strings, paths-as-values, and the [`store::FileStore`] trait.

pub mod exclude;
pub mod models;
pub mod path;
pub mod retrieve;
pub mod store;
