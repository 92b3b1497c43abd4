//! hyperdash - read-only perpetuals account dashboard engine

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;
pub mod websocket;

pub use config::Config;
pub use error::{AppError, Result};
