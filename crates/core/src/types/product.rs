//! Catalogue product types.
//!
//! Field names follow the backend's JSON (`ProductName`, `Rate`, ...), which
//! is also the shape persisted in local storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// The denormalized product fields a cart line or wishlist entry carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    #[serde(rename = "ProductName", default)]
    pub name: Option<String>,
    /// Primary image URL.
    #[serde(rename = "ProductImage", default)]
    pub image: Option<String>,
    /// Unit price; absent prices count as zero.
    #[serde(rename = "Rate", default)]
    pub rate: Option<Price>,
}

impl ProductSummary {
    /// Create a summary with only an ID and price.
    #[must_use]
    pub const fn new(id: ProductId, rate: Price) -> Self {
        Self {
            id,
            name: None,
            image: None,
            rate: Some(rate),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Unit price, treating a missing price as zero.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.rate.unwrap_or_default()
    }
}

/// A product as returned by the product detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    #[serde(rename = "ProductName", default)]
    pub name: Option<String>,
    /// Long description.
    #[serde(rename = "ProductDescription", default)]
    pub description: Option<String>,
    /// Primary image URL.
    #[serde(rename = "ProductImage", default)]
    pub image: Option<String>,
    /// Unit price.
    #[serde(rename = "Rate", default)]
    pub rate: Option<Price>,
    /// Units in stock.
    #[serde(rename = "Qty", default)]
    pub stock: Option<i64>,
    /// Whether the product is featured as trending.
    #[serde(default)]
    pub is_trending: bool,
    /// ID of the category the product is filed under.
    #[serde(default)]
    pub category: Option<String>,
    /// The category itself, when the backend expands it.
    #[serde(default)]
    pub category_details: Option<Category>,
    /// Customer reviews, oldest first.
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Whether the signed-in user may review this product.
    #[serde(default)]
    pub can_review: bool,
}

impl Product {
    /// Whether any stock is left. Unknown stock counts as available.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|qty| qty > 0)
    }

    /// Mean review rating, if the product has any reviews.
    #[must_use]
    pub fn average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let count = u32::try_from(self.reviews.len()).ok()?;
        let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        Some(f64::from(sum) / f64::from(count))
    }

    /// Display name of the category, if known.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category_details.as_ref().map(|c| c.name.as_str())
    }
}

/// A catalogue category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// The user a review is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// A customer review of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub user: Option<ReviewAuthor>,
    /// Stars, 1 to 5.
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            rate: product.rate,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_backend_json() {
        let json = serde_json::json!({
            "id": "a1b2",
            "ProductID": 7,
            "ProductName": "Blender",
            "ProductDescription": "Loud",
            "ProductPrice": 49.5,
            "ProductImage": "/media/blender.png",
            "Rate": 49.5,
            "Qty": 0,
            "is_trending": true
        });
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.id.as_str(), "a1b2");
        assert_eq!(product.rate, Some(Price::from_cents(4950)));
        assert!(!product.in_stock());

        let summary = ProductSummary::from(&product);
        assert_eq!(summary.name.as_deref(), Some("Blender"));
        assert_eq!(summary.unit_price(), Price::from_cents(4950));
    }

    #[test]
    fn test_product_with_category_and_reviews() {
        let json = serde_json::json!({
            "id": "p9",
            "ProductName": "Grill",
            "Rate": 120,
            "category": "c1",
            "category_details": {"id": "c1", "name": "Outdoor", "image": null},
            "reviews": [
                {"id": "r1", "user": {"id": 3, "username": "ada", "first_name": "Ada", "last_name": ""},
                 "rating": 5, "comment": "Great", "created_at": "2026-03-14T09:26:53Z"},
                {"id": "r2", "user": {"id": 4, "username": "bob"},
                 "rating": 2, "comment": "Smoky", "created_at": "2026-03-15T10:00:00Z"}
            ],
            "can_review": true
        });
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.category.as_deref(), Some("c1"));
        assert_eq!(product.category_name(), Some("Outdoor"));
        assert_eq!(product.reviews.len(), 2);
        assert_eq!(product.reviews[0].user.as_ref().unwrap().username, "ada");
        assert_eq!(product.average_rating(), Some(3.5));
        assert!(product.can_review);
    }

    #[test]
    fn test_product_without_reviews_has_no_rating() {
        let product: Product =
            serde_json::from_value(serde_json::json!({"id": "p1", "category": null})).unwrap();
        assert_eq!(product.average_rating(), None);
        assert_eq!(product.category_name(), None);
    }

    #[test]
    fn test_summary_null_rate_is_zero() {
        let summary: ProductSummary =
            serde_json::from_value(serde_json::json!({"id": "p1", "Rate": null})).unwrap();
        assert_eq!(summary.unit_price(), Price::ZERO);
    }
}
