//! Flash Fiesta Core - Shared types library.
//!
//! This crate provides the domain types used across the Flash Fiesta client:
//! - `storefront` - Cart and wishlist stores, REST client, session handling
//! - `cli` - Command-line front end over the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no storage access, no HTTP clients. The cart merge rule lives here so it
//! can be tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Product and order IDs, prices, cart line items and the cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
