//! Scratcher House: pricing and relay service for the house side of a
//! three-round on-chain scratch card game.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod chain;
pub mod config;
pub mod relay;
pub mod strategy;
pub mod symbols;
pub mod types;
