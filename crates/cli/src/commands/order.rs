//! `order` subcommands.

use flash_fiesta_storefront::api::ShippingDetails;
use flash_fiesta_storefront::state::AppState;

use super::CliError;

/// Place an order for the whole cart.
#[allow(clippy::print_stdout)]
pub async fn place(
    state: &AppState,
    full_name: String,
    address: String,
    city: String,
    zip_code: String,
) -> Result<(), CliError> {
    let details = ShippingDetails {
        full_name,
        address,
        city,
        zip_code,
    };
    let total = state.cart().total();
    let order_id = state.checkout().place_order(&details).await?;
    println!("Order #{} placed. Total {total}.", order_id.short());
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn list(state: &AppState) -> Result<(), CliError> {
    let orders = state.checkout().my_orders().await?;
    if orders.is_empty() {
        println!("No orders yet.");
    }
    for order in orders {
        let total = order.total_amount.unwrap_or_else(|| order.items_total());
        println!(
            "#{}  {}  {:<10} {:>3} item(s)  {}",
            order.id.short(),
            order.created_at.format("%Y-%m-%d"),
            order.status,
            order.items.len(),
            total
        );
    }
    Ok(())
}
