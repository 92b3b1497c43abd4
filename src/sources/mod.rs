pub mod hyperliquid;

pub use hyperliquid::{validate_address, InfoClient};
