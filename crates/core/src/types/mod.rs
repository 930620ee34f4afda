//! Core types for Flash Fiesta.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod profile;

pub use cart::{Cart, CartLineItem, MergeReport};
pub use id::{OrderId, ProductId, ProductIdError};
pub use order::{Order, OrderItem, OrderStatus};
pub use price::Price;
pub use product::{Category, Product, ProductSummary, Review, ReviewAuthor};
pub use profile::Profile;
