//! Flash Fiesta CLI - drive the storefront client from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Start a session with a token issued by the backend's login endpoint
//! ff-cli login --token eyJhbGciOi...
//!
//! # Work with the cart (local first, synced while signed in)
//! ff-cli cart add 3f2a9c
//! ff-cli cart update 3f2a9c 3
//! ff-cli cart show
//!
//! # Check out
//! ff-cli order place --name "Ada Lovelace" --address "12 Analytical St" --city London --zip "N1 9GU"
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` - Start or end the session
//! - `cart` - Show and change the cart, pull from or push to the server
//! - `wishlist` - Show or toggle wishlist entries
//! - `order` - Place an order from the cart, list past orders
//! - `products` / `product` / `categories` / `suggest` - Browse the catalogue
//! - `review` - Review a delivered product
//! - `profile` - Show or update account details
//!
//! Configuration comes from `FLASH_FIESTA_*` environment variables (see
//! `flash_fiesta_storefront::config`). A cart sync still waiting for its
//! debounce window is flushed before the process exits.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{ArgGroup, Parser, Subcommand};
use flash_fiesta_storefront::api::{ProductQuery, ProfileUpdate};
use flash_fiesta_storefront::config::ClientConfig;
use flash_fiesta_storefront::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "ff-cli")]
#[command(author, version, about = "Flash Fiesta storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session and merge the server cart into the local one
    Login {
        /// Bearer token (JWT) issued by the backend
        #[arg(short, long)]
        token: String,
    },
    /// End the session and clear the local cart
    Logout,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Place and list orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// List catalogue products
    Products {
        /// Only products whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Only products in this category (ID from `categories`)
        #[arg(short, long)]
        category: Option<String>,
        /// Only trending products
        #[arg(short, long)]
        trending: bool,
    },
    /// Show one product with its reviews
    Product {
        /// Product ID
        id: String,
    },
    /// List catalogue categories
    Categories,
    /// Suggest product names for a partial search
    Suggest {
        /// At least two characters of a product name
        query: String,
    },
    /// Review a product from a delivered order
    Review {
        /// Product ID
        id: String,
        /// Stars, 1 to 5
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        /// Review text
        #[arg(short = 'm', long, default_value = "")]
        comment: String,
    },
    /// Show or update account details
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the profile
    Show,
    /// Change one or more fields
    #[command(group(
        ArgGroup::new("fields")
            .required(true)
            .multiple(true)
            .args(["username", "email", "phone", "address", "city", "zip"])
    ))]
    Update {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        zip: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print line items, count and total
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        id: String,
    },
    /// Remove a product's line
    Remove {
        /// Product ID
        id: String,
    },
    /// Set a product's quantity (0 or less removes it)
    Update {
        /// Product ID
        id: String,
        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
    /// Merge the server cart into the local one
    Pull,
    /// Replace the server cart with the local one now
    Push,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List wishlisted products
    Show,
    /// Add or remove a product
    Toggle {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Place an order for everything in the cart
    Place {
        /// Recipient's full name
        #[arg(short, long)]
        name: String,
        /// Street address
        #[arg(short, long)]
        address: String,
        /// City
        #[arg(short, long)]
        city: String,
        /// ZIP or postal code
        #[arg(short, long)]
        zip: String,
    },
    /// List past orders
    List,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flash_fiesta_storefront=info,flash_fiesta_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");
    let state = AppState::new(config)?;

    let result = dispatch(&state, cli.command).await;

    if let Some(outcome) = state.cart().flush().await {
        tracing::debug!(?outcome, "Flushed pending cart sync");
    }

    result
}

async fn dispatch(state: &AppState, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Login { token } => commands::session::login(state, token).await,
        Commands::Logout => {
            commands::session::logout(state);
            Ok(())
        }
        Commands::Cart { action } => match action {
            CartAction::Show => {
                commands::cart::show(state);
                Ok(())
            }
            CartAction::Add { id } => commands::cart::add(state, &id).await,
            CartAction::Remove { id } => commands::cart::remove(state, &id),
            CartAction::Update { id, quantity } => commands::cart::update(state, &id, quantity),
            CartAction::Clear => {
                commands::cart::clear(state);
                Ok(())
            }
            CartAction::Pull => commands::cart::pull(state).await,
            CartAction::Push => commands::cart::push(state).await,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(state).await,
            WishlistAction::Toggle { id } => commands::wishlist::toggle(state, &id).await,
        },
        Commands::Order { action } => match action {
            OrderAction::Place {
                name,
                address,
                city,
                zip,
            } => commands::order::place(state, name, address, city, zip).await,
            OrderAction::List => commands::order::list(state).await,
        },
        Commands::Products {
            search,
            category,
            trending,
        } => {
            let query = ProductQuery {
                search,
                category,
                trending,
            };
            commands::products::list(state, &query).await
        }
        Commands::Product { id } => commands::products::show(state, &id).await,
        Commands::Categories => commands::products::categories(state).await,
        Commands::Suggest { query } => commands::products::suggest(state, &query).await,
        Commands::Review {
            id,
            rating,
            comment,
        } => commands::products::review(state, &id, rating, &comment).await,
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::profile::show(state).await,
            ProfileAction::Update {
                username,
                email,
                phone,
                address,
                city,
                zip,
            } => {
                let update = ProfileUpdate {
                    username,
                    email,
                    phone_number: phone,
                    address,
                    city,
                    zip_code: zip,
                };
                commands::profile::update(state, &update).await
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_negative_quantity() {
        let cli = Cli::try_parse_from(["ff-cli", "cart", "update", "p1", "-1"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Cart {
                action: CartAction::Update { quantity: -1, .. }
            })
        ));
    }

    #[test]
    fn test_products_filters() {
        let cli = Cli::try_parse_from(["ff-cli", "products", "--category", "c1", "--trending"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Products {
                search: None,
                category: Some(_),
                trending: true,
            })
        ));
    }

    #[test]
    fn test_review_rating_is_bounded() {
        assert!(Cli::try_parse_from(["ff-cli", "review", "p1", "--rating", "6"]).is_err());
        assert!(Cli::try_parse_from(["ff-cli", "review", "p1", "--rating", "0"]).is_err());
        assert!(Cli::try_parse_from(["ff-cli", "review", "p1", "-r", "4", "-m", "Nice"]).is_ok());
    }

    #[test]
    fn test_profile_update_needs_a_field() {
        assert!(Cli::try_parse_from(["ff-cli", "profile", "update"]).is_err());
        assert!(Cli::try_parse_from(["ff-cli", "profile", "update", "--city", "Kochi"]).is_ok());
    }

    #[test]
    fn test_order_place_requires_all_fields() {
        let cli = Cli::try_parse_from(["ff-cli", "order", "place", "--name", "Ada"]);
        assert!(cli.is_err());
    }
}
