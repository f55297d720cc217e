//! Master-key request signing for the Cosmos-compatible REST API.
//!
//! Every request carries an authorization token derived from the HTTP verb,
//! the resource type/link, and the `x-ms-date` header value. The date string
//! signed here must be sent verbatim in the header or the store rejects the
//! request with 401.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("store key is not valid base64: {0}")]
    InvalidKey(String),
}

/// RFC1123 timestamp, lowercased the way the signing contract requires.
pub fn signing_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string().to_lowercase()
}

/// Builds the `authorization` header value for one request.
///
/// `resource_link` is the path of the addressed resource without a leading
/// slash, e.g. `dbs/BibliotecaDB/colls/Regras/docs/library_config` for a
/// point read or `dbs/BibliotecaDB/colls/Regras` for a create.
pub fn authorization_token(
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
    master_key_base64: &str,
) -> Result<String, AuthError> {
    let key = BASE64
        .decode(master_key_base64)
        .map_err(|error| AuthError::InvalidKey(error.to_string()))?;

    let payload = string_to_sign(verb, resource_type, resource_link, date);

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|error| AuthError::InvalidKey(error.to_string()))?;
    mac.update(payload.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    Ok(percent_encode(&format!("type=master&ver=1.0&sig={signature}")))
}

fn string_to_sign(verb: &str, resource_type: &str, resource_link: &str, date: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    )
}

fn percent_encode(input: &str) -> String {
    let mut output = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                output.push(byte as char);
            }
            other => {
                output.push('%');
                output.push_str(&format!("{other:02x}"));
            }
        }
    }
    output
}
