use ethers::types::{Address, Signature};
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Length of a `0x`-prefixed 65-byte ECDSA signature.
const SIGNATURE_HEX_LEN: usize = 2 + 130;

/// Recovers the signer of EIP-191 (`personal_sign`) messages.
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Rejects anything that isn't `0x` followed by 130 hex digits.
    pub fn check_format(signature: &str) -> Result<()> {
        let signature = signature.trim();
        let well_formed = signature.len() == SIGNATURE_HEX_LEN
            && signature.starts_with("0x")
            && signature[2..].chars().all(|c| c.is_ascii_hexdigit());
        if !well_formed {
            return Err(AppError::InvalidSignature);
        }
        Ok(())
    }

    /// Returns `Ok(true)` when `signature` over `message` was produced by `address`.
    pub fn verify_signature(address: &str, message: &str, signature: &str) -> Result<bool> {
        if address.is_empty() || signature.is_empty() {
            return Err(AppError::BadRequest(
                "Address or signature cannot be empty".into(),
            ));
        }

        let signature = signature.trim();
        Self::check_format(signature)?;

        let expected = Address::from_str(address.trim())
            .map_err(|_| AppError::BadRequest("Invalid wallet address".into()))?;
        let parsed = Signature::from_str(signature).map_err(|_| AppError::InvalidSignature)?;
        let recovered = parsed
            .recover(message)
            .map_err(|_| AppError::InvalidSignature)?;

        tracing::debug!("Recovered signer {:?} for {:?}", recovered, expected);
        Ok(recovered == expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{LocalWallet, Signer};

    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn wallet() -> LocalWallet {
        TEST_KEY.parse().unwrap()
    }

    async fn sign(wallet: &LocalWallet, message: &str) -> String {
        let signature = wallet.sign_message(message).await.unwrap();
        format!("0x{}", hex::encode(signature.to_vec()))
    }

    #[test]
    fn empty_inputs_return_bad_request() {
        let result = SignatureVerifier::verify_signature("", "hello", "0xabc");
        match result {
            Err(AppError::BadRequest(msg)) => {
                assert!(msg.contains("Address or signature cannot be empty"));
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }

        let result = SignatureVerifier::verify_signature("0xabc", "hello", "");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn invalid_signature_format_returns_error() {
        let not_hex = format!("0x{}", "zz".repeat(65));
        for bad in ["deadbeef", "0x1234", not_hex.as_str()] {
            let result = SignatureVerifier::verify_signature(
                "0x1234567890123456789012345678901234567890",
                "hello",
                bad,
            );
            assert!(
                matches!(result, Err(AppError::InvalidSignature)),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn genuine_signature_verifies() {
        let wallet = wallet();
        let address = format!("{:?}", wallet.address());
        let signature = sign(&wallet, "hello arena").await;

        let result = SignatureVerifier::verify_signature(&address, "hello arena", &signature);
        assert!(matches!(result, Ok(true)));

        // checksum casing is irrelevant
        let upper = format!("0x{}", address[2..].to_uppercase());
        let result = SignatureVerifier::verify_signature(&upper, "hello arena", &signature);
        assert!(matches!(result, Ok(true)));
    }

    #[tokio::test]
    async fn signature_over_other_message_does_not_verify() {
        let wallet = wallet();
        let address = format!("{:?}", wallet.address());
        let signature = sign(&wallet, "message one").await;

        let result = SignatureVerifier::verify_signature(&address, "message two", &signature);
        assert!(matches!(result, Ok(false)));
    }

    #[tokio::test]
    async fn signature_from_other_wallet_does_not_verify() {
        let signature = sign(&wallet(), "hello arena").await;
        let result = SignatureVerifier::verify_signature(
            "0x1234567890123456789012345678901234567890",
            "hello arena",
            &signature,
        );
        assert!(matches!(result, Ok(false)));
    }
}
