use argon2::{Argon2, PasswordHash, PasswordVerifier};
use log::info;
use serde::Deserialize;

use crate::{
    error::Error,
    objects::Account,
    store::Store,
    utils::{EMAIL_REGEX, generate_token},
};

#[derive(Deserialize)]
pub struct LoginInformation {
    pub email: String,
    pub password: String,
}

/// Same answer for an unknown email and a wrong password
fn incorrect_credentials() -> Error {
    Error::Authentication("Incorrect Email or Password".to_string())
}

/// Verifies the credentials and returns the user's session token, issuing one if needed
pub async fn login(
    store: &dyn Store,
    argon2: &Argon2<'_>,
    info: LoginInformation,
) -> Result<String, Error> {
    if !EMAIL_REGEX.is_match(&info.email) {
        return Err(Error::BadRequest("Enter a valid email address.".to_string()));
    }

    let user = store
        .user_by_email(&info.email)
        .await?
        .ok_or_else(incorrect_credentials)?;

    let parsed_hash =
        PasswordHash::new(&user.password).map_err(|e| Error::PasswordHashError(e.to_string()))?;

    if argon2
        .verify_password(info.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(incorrect_credentials());
    }

    let token = store
        .session_token(user.uuid, generate_token::<16>()?)
        .await?;

    info!("user {} logged in", user.uuid);

    Ok(token)
}

/// Resolves a session token to the caller's account
pub async fn authenticate(store: &dyn Store, token: &str) -> Result<Account, Error> {
    store
        .account_by_token(token)
        .await?
        .ok_or(Error::Unauthorized("Invalid token.".to_string()))
}

pub async fn logout(store: &dyn Store, token: &str) -> Result<(), Error> {
    store.delete_session_token(token).await?;

    info!("session token revoked");

    Ok(())
}
