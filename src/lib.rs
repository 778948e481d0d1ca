//! Aggregate reports over a course visit log.
//!
//! [`ingest`] loads and normalizes a CSV export, [`analytics`] derives the
//! report tables, and [`report`] renders them as markdown or JSON.

pub mod analytics;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod report;
