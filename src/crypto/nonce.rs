use rand::{rngs::OsRng, TryRngCore};

use arena_auth_client::nonce::{nonce_from_entropy, NONCE_ENTROPY_BYTES};

use crate::error::{AppError, Result};

/// Login nonce drawn straight from the operating system's CSPRNG.
///
/// Same format as the client helper, different entropy source.
pub fn generate_nonce_secure() -> Result<String> {
    let mut entropy = [0u8; NONCE_ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| AppError::Internal(format!("OS entropy unavailable: {e}")))?;
    Ok(nonce_from_entropy(&entropy))
}
