//! Flash Fiesta storefront client library.
//!
//! A local-first shopping cart that survives restarts and follows the user
//! across devices once they sign in, plus the wishlist and checkout flows
//! built around it.
//!
//! # Architecture
//!
//! - [`cart::CartStore`] owns the cart, persists every change through
//!   [`storage::LocalStorage`] and pushes it to the backend after a quiet
//!   period ([`debounce::Debouncer`])
//! - [`api::ApiClient`] speaks the backend's REST envelope format
//! - [`session::Session`] holds the bearer token all stores share
//! - [`state::AppState`] wires everything together from a
//!   [`config::ClientConfig`]
//!
//! # Example
//!
//! ```rust,ignore
//! use flash_fiesta_storefront::{config::ClientConfig, state::AppState};
//!
//! let state = AppState::new(ClientConfig::from_env()?)?;
//! state.sign_in(token).await;
//!
//! let product = state.api().get_product(&id).await?;
//! state.cart().add_item(&(&product).into());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod debounce;
pub mod notify;
pub mod session;
pub mod state;
pub mod storage;
pub mod wishlist;
