//! School attendance daemon: a JSON-over-HTTP surface on a SQLite ledger.
//!
//! The domain core lives in [`recorder`] (batch attendance upserts) and
//! [`reports`] (per-student, per-class-month, and dashboard aggregation);
//! [`directory`] holds the administrative registration flows. The [`http`]
//! module is a thin transport over all three.

pub mod auth;
pub mod db;
pub mod directory;
pub mod error;
pub mod http;
pub mod recorder;
pub mod reports;
