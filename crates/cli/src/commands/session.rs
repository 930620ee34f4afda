//! `login` and `logout`.

use flash_fiesta_storefront::cart::SyncOutcome;
use flash_fiesta_storefront::state::AppState;
use secrecy::SecretString;

use super::CliError;

/// Start a session and merge the server cart into the local one.
///
/// A failed cart fetch does not undo the sign-in; an invalid token does.
#[allow(clippy::print_stdout)]
pub async fn login(state: &AppState, token: String) -> Result<(), CliError> {
    let outcome = state.sign_in(SecretString::from(token)).await;

    if !state.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }

    match outcome {
        SyncOutcome::Completed => println!(
            "Signed in. Cart has {} item(s), {} wishlisted.",
            state.cart().count(),
            state.wishlist().len()
        ),
        SyncOutcome::Failed(reason) => {
            println!("Signed in, but the server cart could not be fetched: {reason}");
        }
        SyncOutcome::Skipped => println!("Signed in."),
    }
    Ok(())
}

/// End the session and clear the local cart.
#[allow(clippy::print_stdout)]
pub fn logout(state: &AppState) {
    state.sign_out();
    println!("Signed out. Local cart cleared.");
}
