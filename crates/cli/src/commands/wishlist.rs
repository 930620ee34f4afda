//! `wishlist` subcommands.

use flash_fiesta_core::ProductSummary;
use flash_fiesta_storefront::state::AppState;

use super::{CliError, parse_id};

#[allow(clippy::print_stdout)]
pub async fn show(state: &AppState) -> Result<(), CliError> {
    if !state.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    state.wishlist().fetch().await;

    let items = state.wishlist().items();
    if items.is_empty() {
        println!("Your wishlist is empty.");
    }
    for item in items {
        println!(
            "{:<38} {:<30} {:>10}",
            item.id,
            item.name.as_deref().unwrap_or("-"),
            item.unit_price().to_string()
        );
    }
    Ok(())
}

/// Toggle a product; the store reports the result through its notifier.
pub async fn toggle(state: &AppState, id: &str) -> Result<(), CliError> {
    let id = parse_id(id)?;
    let product = match state.api().get_product(&id).await {
        Ok(product) => ProductSummary::from(&product),
        Err(e) => {
            tracing::debug!(error = %e, "Product lookup failed; toggling by id only");
            ProductSummary {
                id,
                name: None,
                image: None,
                rate: None,
            }
        }
    };
    state.wishlist().toggle(&product).await;
    Ok(())
}
