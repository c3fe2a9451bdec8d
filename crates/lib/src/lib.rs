//! # feedvault
//!
//! Core library for pushing syndication feed entries into a hosted vector store.
//!
//! The crate is organised around three seams, each a trait so the job can be
//! driven against real services or in-memory doubles:
//!
//! - [`ingest::FeedSource`] yields the entries of a feed (implemented by `feedvault-rss`).
//! - [`providers::store::DocumentStorage`] accepts uploaded files.
//! - [`providers::store::IndexService`] manages vector stores and their attached files.
//!
//! [`ingest::JobRunner`] wires them together; [`admin`] holds the one-shot
//! store maintenance operations.

pub mod admin;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod providers;
pub mod retry;
pub mod types;

pub use config::{ApiKey, AppConfig, ConfigError, JobConfig};
pub use errors::{FeedFetchError, JobError, StoreError};
pub use ingest::{FeedEntry, JobReport, JobRunner, JobState};
pub use retry::RetryPolicy;
