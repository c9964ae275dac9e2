use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// Claims carried by a provider-issued access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

impl AccessClaims {
    pub fn is_expired(&self) -> bool {
        self.exp <= chrono::Utc::now().timestamp()
    }
}

/// Decode access token claims without validating the signature.
///
/// The token is only ever obtained from the authentication provider over an
/// authenticated channel; the provider re-validates it on every call that
/// matters. Here the claims are used to know who the cached session belongs
/// to and when it lapses.
pub fn decode_access_claims(token: &str) -> Result<AccessClaims> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 {
        return Err(anyhow::anyhow!("Invalid access token format"));
    }

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| anyhow::anyhow!("Failed to decode access token payload: {}", e))?;

    let claims: AccessClaims = serde_json::from_slice(&payload)
        .map_err(|e| anyhow::anyhow!("Failed to parse access token claims: {}", e))?;

    Ok(claims)
}

/// Build an unsigned token carrying the given claims. Only useful where the
/// signature is never checked, i.e. the in-memory provider double.
pub fn encode_unsigned_token(sub: &str, email: &str, exp: i64) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = AccessClaims {
        sub: sub.to_string(),
        email: Some(email.to_string()),
        exp,
    };
    let payload = general_purpose::URL_SAFE_NO_PAD
        .encode(serde_json::to_vec(&claims).expect("claims serialize"));
    format!("{}.{}.unsigned", header, payload)
}
