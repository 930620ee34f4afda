//! The signed-in user's account profile.

use serde::{Deserialize, Serialize};

/// Account details as the profile endpoint returns them.
///
/// Contact fields double as the default shipping address at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// `OWNER`, `EMPLOYEE` or `CUSTOMER`.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
}

impl Profile {
    /// Whether address, city and ZIP code are all filled in.
    #[must_use]
    pub fn has_shipping_address(&self) -> bool {
        [&self.address, &self.city, &self.zip_code]
            .into_iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}
