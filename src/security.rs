use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::constants::SESSION_TOKEN_BYTES;
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password with bcrypt at the given cost
///
/// CPU bound; call from a blocking task.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Verify a password against a stored bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(password, hash)?)
}

// =============================================================================
// Session Tokens
// =============================================================================

/// Generate a random bearer token (hex encoded)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest under which a session token is stored
///
/// Only `HMAC-SHA256(secret, token)` reaches the database, so a leaked
/// sessions table cannot be replayed without the server secret.
pub fn session_digest(token: &str, secret: &str) -> Result<String> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return Err(AppError::InvalidToken);
        }
    };
    mac.update(token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Extract the token from an `Authorization` header value
///
/// Accepts both a bare token and the `Bearer <token>` form.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let token = header
        .strip_prefix("Bearer ")
        .unwrap_or(header)
        .trim();
    (!token.is_empty()).then_some(token)
}
