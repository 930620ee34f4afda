//! Newtype IDs for type-safe entity references.
//!
//! Product IDs are issued by the backend and treated as opaque: the catalogue
//! hands out UUID strings, but older payloads carry the numeric `ProductID`.
//! Both shapes deserialize into the same [`ProductId`], keyed by string form.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing a [`ProductId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductIdError {
    /// The input string is empty or whitespace.
    #[error("product id cannot be empty")]
    Empty,
}

/// Opaque identifier of a catalogue product.
///
/// ```
/// use flash_fiesta_core::ProductId;
///
/// let id = ProductId::parse("p1").unwrap();
/// assert_eq!(id.as_str(), "p1");
///
/// // Numeric ids compare by their string form
/// assert_eq!(ProductId::from(42_i64), ProductId::parse("42").unwrap());
///
/// assert!(ProductId::parse("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawId", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Parse a product ID, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ProductIdError::Empty`] if nothing remains after trimming.
    pub fn parse(s: &str) -> Result<Self, ProductIdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ProductIdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for ProductId {
    type Err = ProductIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

/// Wire representation: the backend emits either a string or a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl TryFrom<RawId> for ProductId {
    type Error = ProductIdError;

    fn try_from(raw: RawId) -> Result<Self, Self::Error> {
        match raw {
            RawId::Text(s) => Self::parse(&s),
            RawId::Number(n) => Ok(Self::from(n)),
        }
    }
}

/// Identifier of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Wrap an order UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Short reference shown to customers (first 8 hex digits).
    #[must_use]
    pub fn short(&self) -> String {
        self.0.simple().to_string().chars().take(8).collect()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl core::str::FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_from_json_string() {
        let id: ProductId = serde_json::from_str("\"3f2a\"").unwrap();
        assert_eq!(id.as_str(), "3f2a");
    }

    #[test]
    fn test_product_id_from_json_number() {
        let id: ProductId = serde_json::from_str("17").unwrap();
        assert_eq!(id, ProductId::parse("17").unwrap());
    }

    #[test]
    fn test_product_id_rejects_empty_json() {
        assert!(serde_json::from_str::<ProductId>("\"\"").is_err());
    }

    #[test]
    fn test_product_id_serializes_as_string() {
        let id = ProductId::from(5);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"5\"");
    }

    #[test]
    fn test_product_id_trims() {
        assert_eq!(ProductId::parse(" p1 ").unwrap().as_str(), "p1");
    }

    #[test]
    fn test_order_id_short() {
        let id: OrderId = "6f1c2d3e-0000-4000-8000-000000000000".parse().unwrap();
        assert_eq!(id.short(), "6f1c2d3e");
    }
}
