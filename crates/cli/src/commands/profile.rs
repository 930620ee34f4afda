//! `profile` subcommands.

use flash_fiesta_storefront::api::ProfileUpdate;
use flash_fiesta_storefront::state::AppState;

use super::CliError;

#[allow(clippy::print_stdout)]
pub async fn show(state: &AppState) -> Result<(), CliError> {
    if !state.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    let profile = state.api().get_profile().await?;

    let field = |value: Option<&str>| value.unwrap_or("-").to_string();
    println!("{}", profile.username);
    println!("  email:   {}", field(profile.email.as_deref()));
    println!("  role:    {}", field(profile.role.as_deref()));
    println!("  phone:   {}", field(profile.phone_number.as_deref()));
    println!("  address: {}", field(profile.address.as_deref()));
    println!("  city:    {}", field(profile.city.as_deref()));
    println!("  zip:     {}", field(profile.zip_code.as_deref()));
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn update(state: &AppState, update: &ProfileUpdate) -> Result<(), CliError> {
    if !state.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    state.api().update_profile(update).await?;
    println!("Profile updated.");
    Ok(())
}
