use std::sync::LazyLock;

use axum::http::{HeaderMap, header::AUTHORIZATION};
use getrandom::fill;
use hex::encode;
use regex::Regex;

use crate::error::Error;

pub static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-A-Za-z0-9!#$%&'*+/=?^_`{|}~]+(?:\.[-A-Za-z0-9!#$%&'*+/=?^_`{|}~]+)*@(?:[A-Za-z0-9](?:[-A-Za-z0-9]*[A-Za-z0-9])?\.)+[A-Za-z0-9](?:[-A-Za-z0-9]*[A-Za-z0-9])?$").unwrap()
});

pub static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());

pub fn is_valid_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}

pub fn generate_token<const N: usize>() -> Result<String, getrandom::Error> {
    let mut buf = [0u8; N];
    fill(&mut buf)?;
    Ok(encode(buf))
}

/// Pulls the token out of `Authorization: Bearer <token>` or `Authorization: Token <token>`
pub fn get_auth_header(headers: &HeaderMap) -> Result<&str, Error> {
    let auth_token = headers.get(AUTHORIZATION).ok_or(Error::Unauthorized(
        "Authentication credentials were not provided.".to_string(),
    ))?;

    let auth_raw = auth_token
        .to_str()
        .map_err(|_| Error::Unauthorized("Invalid token header.".to_string()))?;

    let mut auth = auth_raw.split_whitespace();

    let auth_type = auth.next().ok_or(Error::Unauthorized(
        "Authentication credentials were not provided.".to_string(),
    ))?;

    if auth_type != "Bearer" && auth_type != "Token" {
        return Err(Error::Unauthorized(
            "Only token auth is supported".to_string(),
        ));
    }

    let auth_value = auth
        .next()
        .ok_or(Error::Unauthorized("No token provided".to_string()))?;

    if auth.next().is_some() {
        return Err(Error::Unauthorized(
            "Token string should not contain spaces.".to_string(),
        ));
    }

    Ok(auth_value)
}
