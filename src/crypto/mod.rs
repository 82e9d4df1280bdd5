//! Server-only cryptography: secret handling, token issuance/verification,
//! login nonces from the OS entropy source, and wallet signature recovery.
//!
//! Nothing here is re-exported by `arena-auth-client`; client builds can't
//! link this module.

pub mod jwt;
pub mod nonce;
pub mod secret;
pub mod signature;
