use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

/// Bytes of entropy in every refresh token (256 bits).
pub const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
#[error("operating system random source failed: {0}")]
pub struct RandomError(#[from] rand::Error);

/// Generates an opaque refresh token.
///
/// Draws [`REFRESH_TOKEN_BYTES`] from the operating system CSPRNG and encodes
/// them as unpadded URL-safe base64, giving a 43 character string.
///
/// # Errors
///
/// Returns [`RandomError`] when the OS random source fails. No fallback
/// generator is tried.
///
/// # Examples
///
/// ```
/// let token = tokengate::utils::refresh_token::generate_refresh_token().unwrap();
/// assert_eq!(token.len(), 43);
/// ```
pub fn generate_refresh_token() -> Result<String, RandomError> {
    fill_and_encode(&mut OsRng)
}

fn fill_and_encode<R: RngCore>(rng: &mut R) -> Result<String, RandomError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
