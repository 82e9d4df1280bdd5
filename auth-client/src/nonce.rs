use rand::Rng;

use crate::address::normalize_address;

/// Application phrase embedded in every nonce so a signed login message
/// can't be mistaken for one issued by another dapp.
pub const NONCE_PHRASE: &str = "ArenaLogin";

/// Bytes of randomness per nonce.
pub const NONCE_ENTROPY_BYTES: usize = 16;

/// Fresh login nonce from the thread-local RNG.
///
/// Uniqueness is the anti-replay property; the value is not a secret.
pub fn generate_nonce() -> String {
    let mut entropy = [0u8; NONCE_ENTROPY_BYTES];
    rand::rng().fill(&mut entropy);
    nonce_from_entropy(&entropy)
}

/// Formats caller-supplied entropy as a nonce: `<phrase>_<unix millis>_<hex>`.
pub fn nonce_from_entropy(entropy: &[u8]) -> String {
    format!(
        "{}_{}_{}",
        NONCE_PHRASE,
        chrono::Utc::now().timestamp_millis(),
        hex::encode(entropy)
    )
}

/// Message the wallet signs. Deterministic in its inputs so the server can
/// rebuild it byte for byte before recovering the signer.
pub fn create_auth_message(wallet_address: &str, nonce: &str) -> String {
    format!(
        "Welcome to Arena!\n\n\
         Sign this message to prove you own this wallet.\n\n\
         Wallet: {}\n\
         Nonce: {}\n\n\
         This request will not trigger a blockchain transaction or cost any gas fees.",
        normalize_address(wallet_address),
        nonce
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_are_unique_and_tagged() {
        let first = generate_nonce();
        let second = generate_nonce();

        assert_ne!(first, second);
        for nonce in [&first, &second] {
            assert!(nonce.contains(NONCE_PHRASE));
            assert!(nonce.len() > 20);
        }
    }

    #[test]
    fn nonce_embeds_hex_entropy() {
        let nonce = nonce_from_entropy(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(nonce.starts_with("ArenaLogin_"));
        assert!(nonce.ends_with("_deadbeef"));
    }

    #[test]
    fn auth_message_contains_lowercased_wallet_and_exact_nonce() {
        let nonce = "ArenaLogin_1700000000000_00ff";
        let message =
            create_auth_message("0xABCDEF0123456789ABCDEF0123456789ABCDEF01", nonce);

        assert!(message.contains("0xabcdef0123456789abcdef0123456789abcdef01"));
        assert!(!message.contains("0xABCDEF"));
        assert!(message.contains(nonce));
    }

    #[test]
    fn auth_message_is_deterministic() {
        let wallet = "0x1234567890123456789012345678901234567890";
        let nonce = generate_nonce();
        assert_eq!(
            create_auth_message(wallet, &nonce),
            create_auth_message(&wallet.to_uppercase().replace("0X", "0x"), &nonce)
        );
    }
}
