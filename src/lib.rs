//! Client core for a stay marketplace: progressive-relaxation property
//! search, result ranking, and host-side reservation bookkeeping.

pub mod client;
pub mod config;
pub mod error;
pub mod hosting;
pub mod models;
pub mod probe;
pub mod search;

pub use client::MarketplaceClient;
pub use config::Settings;
pub use error::BackendError;
