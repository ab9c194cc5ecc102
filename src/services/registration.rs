use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Error,
    objects::User,
    store::Store,
    utils::{EMAIL_REGEX, is_valid_name},
};

#[derive(Deserialize)]
pub struct SignupInformation {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

/// Public fields of a freshly registered user
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SignedUp {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

pub async fn register(
    store: &dyn Store,
    argon2: &Argon2<'_>,
    info: SignupInformation,
) -> Result<SignedUp, Error> {
    if !EMAIL_REGEX.is_match(&info.email) {
        return Err(Error::BadRequest("Enter a valid email address.".to_string()));
    }

    if info.password.is_empty() {
        return Err(Error::BadRequest("Password may not be blank.".to_string()));
    }

    if info.password != info.password2 {
        return Err(Error::BadRequest("Passwords don't match".to_string()));
    }

    if store.email_taken(&info.email).await? {
        return Err(Error::BadRequest("Email already exists".to_string()));
    }

    if !is_valid_name(&info.first_name) {
        return Err(Error::BadRequest(
            "Firstname should only contain characters".to_string(),
        ));
    }

    if !is_valid_name(&info.last_name) {
        return Err(Error::BadRequest(
            "Lastname should only contain characters".to_string(),
        ));
    }

    let username = unique_username(store).await?;

    let salt = SaltString::generate(&mut OsRng);

    let hashed_password = argon2
        .hash_password(info.password.as_bytes(), &salt)
        .map_err(|e| Error::PasswordHashError(e.to_string()))?;

    let user = User {
        uuid: Uuid::now_v7(),
        username,
        first_name: info.first_name,
        last_name: info.last_name,
        email: info.email,
        password: hashed_password.to_string(),
        created_at: Utc::now(),
    };

    let signed_up = SignedUp {
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    };

    let account = store.create_user(user).await?;

    info!("registered account {}", account.id);

    Ok(signed_up)
}

/// Opaque internal username, regenerated until no existing user holds it
async fn unique_username(store: &dyn Store) -> Result<String, Error> {
    loop {
        let candidate = Uuid::new_v4().simple().to_string();

        if !store.username_taken(&candidate).await? {
            return Ok(candidate);
        }

        debug!("generated username {candidate} is taken, retrying");
    }
}
