//! Client-safe wallet login helpers.
//!
//! Nothing in this crate holds or reads a signing secret. Token inspection is
//! read-only and untrusted: use it for display and local expiry checks, never
//! for authorization. Trusted verification lives in the server package only.

pub mod address;
pub mod inspect;
pub mod nonce;

pub use address::{is_valid_address, normalize_address};
pub use inspect::{decode_claims, extract_wallet_from_jwt, is_jwt_expired, DecodeError, UnverifiedClaims};
pub use nonce::{create_auth_message, generate_nonce, nonce_from_entropy, NONCE_PHRASE};
