//! Wire types for the backend's JSON envelope and request bodies.

use flash_fiesta_core::{CartLineItem, Price, ProductId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `Status` value the backend uses for a successful response.
pub const SUCCESS_STATUS: i64 = 6000;

/// Every backend response is wrapped in this envelope.
///
/// Rejections carry their reason in `message`, or in `data` when it is a
/// plain string.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Status")]
    pub status: i64,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub wishlisted: Option<bool>,
    #[serde(default)]
    pub order_id: Option<String>,
}

impl Envelope {
    /// Whether the backend accepted the request.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Human-readable reason attached to the response, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        [&self.message, &self.data]
            .into_iter()
            .flatten()
            .find_map(|value| match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                _ => None,
            })
    }
}

/// Body of `POST api/product/Cart/Sync/`.
#[derive(Debug, Serialize)]
pub struct SyncCartRequest<'a> {
    pub items: &'a [CartLineItem],
}

/// Body of `POST api/product/Wishlist/Toggle/`.
#[derive(Debug, Serialize)]
pub struct ToggleWishlistRequest<'a> {
    pub product_id: &'a ProductId,
}

/// One line of an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<&CartLineItem> for OrderLine {
    fn from(item: &CartLineItem) -> Self {
        Self {
            product_id: item.id.clone(),
            quantity: item.quantity,
        }
    }
}

/// Body of `POST api/order/place/`.
#[derive(Debug, Serialize)]
pub struct PlaceOrderRequest<'a> {
    pub full_name: &'a str,
    pub address: &'a str,
    pub city: &'a str,
    pub zip_code: &'a str,
    pub total_amount: Price,
    pub items: Vec<OrderLine>,
}

/// Where an order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

impl ShippingDetails {
    /// Name of the first blank field, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("full_name", &self.full_name),
            ("address", &self.address),
            ("city", &self.city),
            ("zip_code", &self.zip_code),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Filters for the product list endpoint.
///
/// Blank `search` and `category` values mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    /// Case-insensitive name search.
    pub search: Option<String>,
    /// Category ID.
    pub category: Option<String>,
    /// Only products flagged as trending.
    pub trending: bool,
}

impl ProductQuery {
    /// Query matching every product.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    #[must_use]
    pub fn category(mut self, id: impl Into<String>) -> Self {
        self.category = Some(id.into());
        self
    }

    #[must_use]
    pub const fn trending(mut self) -> Self {
        self.trending = true;
        self
    }

    /// Trim the text filters and drop the blank ones.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            search: clean(self.search),
            category: clean(self.category),
            trending: self.trending,
        }
    }

    /// Query string pairs in the form the backend reads them.
    pub(crate) fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.as_str()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.as_str()));
        }
        if self.trending {
            pairs.push(("trending", "true"));
        }
        pairs
    }
}

/// Body of `POST api/product/CreateReview/`.
#[derive(Debug, Serialize)]
pub struct ReviewRequest<'a> {
    pub product_id: &'a ProductId,
    pub rating: u8,
    pub comment: &'a str,
}

/// Body of `POST api/auth/profile/update/`. Only the set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

impl ProfileUpdate {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
