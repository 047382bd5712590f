//! portfolio-pulse-cli: command-line front end for the portfolio-pulse engine.
//!
//! Uploads a portfolio from JSON, persists it in a JSON file store, and prints
//! scores, model comparisons and rebalance suggestions. Every request is
//! authenticated with a bearer token and recorded in a JSONL audit trail.

pub mod audit;
pub mod commands;
pub mod config;
pub mod error;
pub mod file_store;
pub mod input;
pub mod prices;
