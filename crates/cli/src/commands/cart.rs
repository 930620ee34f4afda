//! `cart` subcommands.

use flash_fiesta_core::ProductSummary;
use flash_fiesta_storefront::cart::SyncOutcome;
use flash_fiesta_storefront::state::AppState;

use super::{CliError, parse_id};

/// Print line items, count and total.
#[allow(clippy::print_stdout)]
pub fn show(state: &AppState) {
    let cart = state.cart().snapshot();
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for item in cart.items() {
        println!(
            "{:<38} {:<30} {:>4} x {:>10} = {:>10}",
            item.id,
            item.name.as_deref().unwrap_or("-"),
            item.quantity,
            item.unit_price().to_string(),
            item.line_total().to_string(),
        );
    }
    println!("Items: {}  Total: {}", cart.count(), cart.total());
}

/// Look the product up, then add one unit.
#[allow(clippy::print_stdout)]
pub async fn add(state: &AppState, id: &str) -> Result<(), CliError> {
    let id = parse_id(id)?;
    let product = state.api().get_product(&id).await?;
    if !product.in_stock() {
        tracing::warn!(product_id = %id, "Product is out of stock");
    }

    let quantity = state.cart().add_item(&ProductSummary::from(&product));
    println!(
        "Added {} (now {quantity} in cart).",
        product.name.as_deref().unwrap_or(id.as_str())
    );
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn remove(state: &AppState, id: &str) -> Result<(), CliError> {
    let id = parse_id(id)?;
    if state.cart().remove_item(&id) {
        println!("Removed {id}.");
    } else {
        println!("{id} is not in the cart.");
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn update(state: &AppState, id: &str, quantity: i64) -> Result<(), CliError> {
    let id = parse_id(id)?;
    if !state.cart().contains(&id) {
        println!("{id} is not in the cart.");
    } else if state.cart().update_quantity(&id, quantity) && quantity < 1 {
        println!("Removed {id}.");
    } else {
        println!("{id} quantity set to {quantity}.");
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn clear(state: &AppState) {
    state.cart().clear();
    println!("Cart cleared.");
}

/// Merge the server cart into the local one.
#[allow(clippy::print_stdout)]
pub async fn pull(state: &AppState) -> Result<(), CliError> {
    match state.cart().fetch_remote().await {
        SyncOutcome::Completed => {
            println!("Cart merged. {} item(s).", state.cart().count());
            Ok(())
        }
        SyncOutcome::Skipped => Err(CliError::NotSignedIn),
        SyncOutcome::Failed(reason) => Err(CliError::Sync { op: "fetch", reason }),
    }
}

/// Replace the server cart with the local one.
#[allow(clippy::print_stdout)]
pub async fn push(state: &AppState) -> Result<(), CliError> {
    // A sync still waiting for its window carries the same cart
    let outcome = match state.cart().flush().await {
        Some(outcome) => outcome,
        None => state.cart().sync_remote().await,
    };
    match outcome {
        SyncOutcome::Completed => {
            println!("Server cart updated.");
            Ok(())
        }
        SyncOutcome::Skipped => Err(CliError::NotSignedIn),
        SyncOutcome::Failed(reason) => Err(CliError::Sync { op: "sync", reason }),
    }
}
