//! Algorand account address validation.
//!
//! An address is the base32 (no padding) encoding of a 32-byte public key
//! followed by the last 4 bytes of its SHA-512/256 digest.

use data_encoding::BASE32_NOPAD;
use regex::Regex;
use sha2::{Digest, Sha512_256};
use std::sync::LazyLock;
use thiserror::Error;

const PUBLIC_KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;

static ADDRESS_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z2-7]{58}$").expect("address pattern compiles"));

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("address '{0}' is not 58 base32 characters")]
    Shape(String),

    #[error("address '{0}' has an invalid checksum")]
    Checksum(String),
}

pub fn validate(address: &str) -> Result<(), AddressError> {
    if !ADDRESS_SHAPE.is_match(address) {
        return Err(AddressError::Shape(address.to_string()));
    }

    let bytes = BASE32_NOPAD
        .decode(address.as_bytes())
        .map_err(|_| AddressError::Shape(address.to_string()))?;
    if bytes.len() != PUBLIC_KEY_LEN + CHECKSUM_LEN {
        return Err(AddressError::Shape(address.to_string()));
    }
    let (key, checksum) = bytes.split_at(PUBLIC_KEY_LEN);
    let digest = Sha512_256::digest(key);
    if digest[digest.len() - CHECKSUM_LEN..] != *checksum {
        return Err(AddressError::Checksum(address.to_string()));
    }
    Ok(())
}

/// Split a comma-separated list and validate every entry.
pub fn parse_accounts(list: &str) -> Result<Vec<String>, AddressError> {
    let mut accounts = Vec::new();
    for raw in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        validate(raw)?;
        if !accounts.iter().any(|a| a == raw) {
            accounts.push(raw.to_string());
        }
    }
    Ok(accounts)
}
