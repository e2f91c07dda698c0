//! Verification of Telegram Mini-App `initData` payloads.
//!
//! The platform signs the launch parameters with a key derived from the bot
//! secret; verifying that signature is the only proof we accept that a
//! Mini-App session belongs to a real Telegram user.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("init data carries no hash field")]
    MissingHash,
    #[error("init data signature mismatch")]
    InvalidSignature,
    #[error("user field missing or malformed")]
    MalformedUser,
}

/// Profile extracted from a payload whose signature checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub language_code: String,
}

/// Shape of the `user` field inside initData. Field names are the
/// platform's snake_case; everything but `id` is optional.
#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
    #[serde(default)]
    username: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    language_code: String,
}

/// Verify an `initData` payload against the shared bot secret and extract
/// the embedded user profile. Pure function of its two inputs.
///
/// The scheme is the documented one: `secret_key = HMAC_SHA256(key =
/// "WebAppData", message = bot_secret)`, then the supplied `hash` must
/// equal `HMAC_SHA256(key = secret_key, message = check_string)` where the
/// check string is every non-hash pair rendered `key=value`, sorted by key
/// bytewise, joined with `\n`.
pub fn verify_init_data(init_data: &str, bot_secret: &str) -> Result<VerifiedUser, AuthError> {
    // Percent-decoded pairs; on a repeated key the last value wins.
    let mut fields: BTreeMap<String, String> = url::form_urlencoded::parse(init_data.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let supplied_hash = fields.remove("hash").ok_or(AuthError::MissingHash)?;

    let check_string = fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut kdf = HmacSha256::new_from_slice(b"WebAppData").expect("HMAC accepts any key length");
    kdf.update(bot_secret.as_bytes());
    let secret_key = kdf.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret_key).expect("HMAC accepts any key length");
    mac.update(check_string.as_bytes());

    // Constant-time comparison; a hash that is not even hex is just invalid.
    let supplied = hex::decode(&supplied_hash).map_err(|_| AuthError::InvalidSignature)?;
    mac.verify_slice(&supplied)
        .map_err(|_| AuthError::InvalidSignature)?;

    let user_json = fields.get("user").ok_or(AuthError::MalformedUser)?;
    let user: TgUser = serde_json::from_str(user_json).map_err(|_| AuthError::MalformedUser)?;

    Ok(VerifiedUser {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        language_code: user.language_code,
    })
}

/// Compute the lowercase-hex signature for a set of already-decoded pairs.
/// Exposed for tests and tooling that need to mint valid payloads.
pub fn sign_pairs(pairs: &[(&str, &str)], bot_secret: &str) -> String {
    let sorted: BTreeMap<&str, &str> = pairs.iter().copied().collect();
    let check_string = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut kdf = HmacSha256::new_from_slice(b"WebAppData").expect("HMAC accepts any key length");
    kdf.update(bot_secret.as_bytes());
    let secret_key = kdf.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret_key).expect("HMAC accepts any key length");
    mac.update(check_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Build a complete, correctly signed `initData` string from decoded pairs.
pub fn signed_payload(pairs: &[(&str, &str)], bot_secret: &str) -> String {
    let hash = sign_pairs(pairs, bot_secret);
    let mut ser = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        ser.append_pair(k, v);
    }
    ser.append_pair("hash", &hash);
    ser.finish()
}
