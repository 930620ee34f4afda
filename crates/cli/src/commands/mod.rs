//! Subcommand implementations.
//!
//! Command output goes to stdout; diagnostics go through `tracing`.

pub mod cart;
pub mod order;
pub mod products;
pub mod profile;
pub mod session;
pub mod wishlist;

use flash_fiesta_core::{ProductId, ProductIdError};
use flash_fiesta_storefront::api::ApiError;
use flash_fiesta_storefront::checkout::CheckoutError;
use flash_fiesta_storefront::config::ConfigError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Order could not be placed.
    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    /// A product ID argument was malformed.
    #[error("Invalid product id: {0}")]
    InvalidProductId(#[from] ProductIdError),

    /// Remote cart operation did not complete.
    #[error("Cart {op} failed: {reason}")]
    Sync { op: &'static str, reason: String },

    /// The command needs a session.
    #[error("Not signed in. Run `ff-cli login --token <TOKEN>` first")]
    NotSignedIn,
}

fn parse_id(raw: &str) -> Result<ProductId, CliError> {
    Ok(ProductId::parse(raw)?)
}
