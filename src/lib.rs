//! stockdata: storage for an issuer registry, insider trades and daily
//! price bars.
//!
//! Hexagonal architecture: domain types and column rules in [`domain`], port
//! traits in [`ports`], storage backends and configuration in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
