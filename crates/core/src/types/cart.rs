//! Shopping cart state and the merge-on-fetch rule.
//!
//! [`Cart`] is a plain value: every transition is synchronous and total, and
//! derived values (`total`, `count`) are recomputed from the line items on
//! each call. Persistence and remote synchronization live in the storefront
//! crate.
//!
//! # Invariants
//!
//! - No two line items share a [`ProductId`].
//! - Every line item has `quantity >= 1`.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::product::ProductSummary;

/// One product in the cart with its requested quantity.
///
/// Display fields are copied from the product when it is added and are not
/// refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Product identifier.
    pub id: ProductId,
    /// Display name at add time.
    #[serde(rename = "ProductName", default)]
    pub name: Option<String>,
    /// Image URL at add time.
    #[serde(rename = "ProductImage", default)]
    pub image: Option<String>,
    /// Unit price at add time.
    #[serde(rename = "Rate", default)]
    pub rate: Option<Price>,
    /// Requested quantity.
    pub quantity: u32,
}

impl CartLineItem {
    /// Create a line item for `product` with the given quantity.
    #[must_use]
    pub fn new(product: &ProductSummary, quantity: u32) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            rate: product.rate,
            quantity,
        }
    }

    /// Unit price, treating a missing price as zero.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.rate.unwrap_or_default()
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity)
    }

    /// Overwrite display fields with those present on `fresher`.
    fn refresh_display(&mut self, fresher: &Self) {
        if fresher.name.is_some() {
            self.name.clone_from(&fresher.name);
        }
        if fresher.image.is_some() {
            self.image.clone_from(&fresher.image);
        }
        if fresher.rate.is_some() {
            self.rate = fresher.rate;
        }
    }
}

/// Summary of what a [`Cart::merge`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    /// Items present on both sides whose quantity was raised to the server's.
    pub raised: usize,
    /// Server items that were not in the local cart.
    pub appended: usize,
}

impl MergeReport {
    /// Whether the merge changed any quantity or added any item.
    #[must_use]
    pub const fn changed_quantities(&self) -> bool {
        self.raised > 0 || self.appended > 0
    }
}

/// A line as read back from storage or the server.
///
/// Anything that does not parse as a line lands in `Unreadable`, so one bad
/// entry never costs the rest of the cart.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLine {
    Line(StoredLineItem),
    Unreadable(IgnoredAny),
}

#[derive(Deserialize)]
struct StoredLineItem {
    id: ProductId,
    #[serde(rename = "ProductName", default)]
    name: Option<String>,
    #[serde(rename = "ProductImage", default)]
    image: Option<String>,
    #[serde(rename = "Rate", default)]
    rate: Option<Price>,
    #[serde(default)]
    quantity: Option<i64>,
}

impl StoredLine {
    /// The line item, or `None` when the entry is unusable or its quantity
    /// is missing or below 1.
    fn into_item(self) -> Option<CartLineItem> {
        let Self::Line(line) = self else {
            return None;
        };
        let quantity = line.quantity.filter(|q| *q > 0)?;
        Some(CartLineItem {
            id: line.id,
            name: line.name,
            image: line.image,
            rate: line.rate,
            quantity: u32::try_from(quantity).unwrap_or(u32::MAX),
        })
    }
}

/// An ordered collection of line items keyed by product ID.
///
/// Deserialization is lenient: unreadable entries and entries with a
/// quantity below 1 are dropped, and repeated IDs are folded together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(into = "Vec<CartLineItem>")]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from possibly unnormalized items.
    ///
    /// Items with quantity 0 are dropped; repeated IDs are folded into the
    /// first occurrence with their quantities summed.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartLineItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            match cart.position(&item.id) {
                Some(idx) => {
                    if let Some(existing) = cart.items.get_mut(idx) {
                        existing.quantity = existing.quantity.saturating_add(item.quantity);
                    }
                }
                None => cart.items.push(item),
            }
        }
        cart
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up the line item for a product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Whether the product is in the cart.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of `product`, appending a new line if needed.
    ///
    /// Returns the product's quantity after the add.
    pub fn add(&mut self, product: &ProductSummary) -> u32 {
        if let Some(existing) = self.items.iter_mut().find(|item| item.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return existing.quantity;
        }
        self.items.push(CartLineItem::new(product, 1));
        1
    }

    /// Remove the line for `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }

    /// Set the quantity for `id`; a quantity below 1 removes the line.
    ///
    /// Unknown IDs are ignored. Returns whether the cart changed.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) -> bool {
        if quantity < 1 {
            return self.remove(id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Take the quantities in `ordered` out of the cart.
    ///
    /// Lines that reach zero are removed. Units added after `ordered` was
    /// taken stay in the cart. Returns whether anything changed.
    pub fn remove_ordered(&mut self, ordered: &[CartLineItem]) -> bool {
        let mut changed = false;
        for line in ordered {
            let Some(idx) = self.position(&line.id) else {
                continue;
            };
            let remaining = self
                .items
                .get(idx)
                .map_or(0, |item| item.quantity.saturating_sub(line.quantity));
            if remaining == 0 {
                self.items.remove(idx);
            } else if let Some(item) = self.items.get_mut(idx) {
                item.quantity = remaining;
            }
            changed = true;
        }
        changed
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Merge a server snapshot into this cart.
    ///
    /// For products on both sides the quantity becomes the larger of the two
    /// and display fields take the server's values where present, since the
    /// server builds them from live product data. Server-only products are
    /// appended; local-only products are kept. Nothing is ever removed.
    pub fn merge(&mut self, server: impl IntoIterator<Item = CartLineItem>) -> MergeReport {
        let mut report = MergeReport::default();
        for remote in Self::from_items(server).items {
            if let Some(local) = self.items.iter_mut().find(|item| item.id == remote.id) {
                if remote.quantity > local.quantity {
                    local.quantity = remote.quantity;
                    report.raised += 1;
                }
                local.refresh_display(&remote);
            } else {
                self.items.push(remote);
                report.appended += 1;
            }
        }
        report
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let lines = Vec::<StoredLine>::deserialize(deserializer)?;
        Ok(Self::from_items(
            lines.into_iter().filter_map(StoredLine::into_item),
        ))
    }
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartLineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLineItem;
    type IntoIter = core::slice::Iter<'a, CartLineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
