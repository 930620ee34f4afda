//! Cache types for catalogue responses.

use flash_fiesta_core::{Category, Product, ProductId};

use super::types::ProductQuery;

/// Cache key for catalogue lookups. Each distinct product query is cached
/// on its own.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(ProductQuery),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Categories(Vec<Category>),
}
