//! `products`, `product`, `categories`, `suggest` and `review`.

use flash_fiesta_storefront::api::ProductQuery;
use flash_fiesta_storefront::state::AppState;

use super::{CliError, parse_id};

#[allow(clippy::print_stdout)]
pub async fn list(state: &AppState, query: &ProductQuery) -> Result<(), CliError> {
    let products = state.api().list_products(query).await?;
    if products.is_empty() {
        println!("No products found.");
    }
    for product in products {
        println!(
            "{:<38} {:<30} {:>10}{}{}",
            product.id,
            product.name.as_deref().unwrap_or("-"),
            product.rate.unwrap_or_default().to_string(),
            if product.is_trending { "  trending" } else { "" },
            if product.in_stock() { "" } else { "  (sold out)" }
        );
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn show(state: &AppState, id: &str) -> Result<(), CliError> {
    let id = parse_id(id)?;
    let product = state.api().get_product(&id).await?;

    println!("{}", product.name.as_deref().unwrap_or(id.as_str()));
    println!("  id:       {}", product.id);
    println!("  price:    {}", product.rate.unwrap_or_default());
    if let Some(category) = product.category_name() {
        println!("  category: {category}");
    }
    if let Some(stock) = product.stock {
        println!("  stock:    {stock}");
    }
    if let Some(rating) = product.average_rating() {
        println!("  rating:   {rating:.1} ({} reviews)", product.reviews.len());
    }
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("{description}");
    }
    for review in &product.reviews {
        let author = review.user.as_ref().map_or("anonymous", |u| u.username.as_str());
        println!();
        println!("  {}/5 by {author} on {}", review.rating, review.created_at.format("%Y-%m-%d"));
        if !review.comment.is_empty() {
            println!("  {}", review.comment);
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn categories(state: &AppState) -> Result<(), CliError> {
    let categories = state.api().list_categories().await?;
    if categories.is_empty() {
        println!("No categories.");
    }
    for category in categories {
        println!("{:<38} {}", category.id, category.name);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn suggest(state: &AppState, query: &str) -> Result<(), CliError> {
    for name in state.api().search_suggestions(query).await? {
        println!("{name}");
    }
    Ok(())
}

/// Review a delivered product.
#[allow(clippy::print_stdout)]
pub async fn review(state: &AppState, id: &str, rating: u8, comment: &str) -> Result<(), CliError> {
    if !state.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    let id = parse_id(id)?;
    state.api().create_review(&id, rating, comment).await?;
    println!("Review added.");
    Ok(())
}
