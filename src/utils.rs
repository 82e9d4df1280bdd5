// Utility modules

use std::{future::Future, time::Duration};

use arena_auth_client::{is_valid_address, normalize_address};

use crate::error::{AppError, Result};

/// Runs `fut` under `limit`, surfacing an elapsed deadline as `AppError::Timeout`.
pub async fn with_timeout<T, E, F>(limit: Duration, what: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Into<AppError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(AppError::Timeout(what)),
    }
}

/// Validates and normalizes a wallet address taken from a request.
pub fn require_wallet(raw: Option<&str>) -> Result<String> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("walletAddress is required".to_string()))?;
    if !is_valid_address(raw) {
        return Err(AppError::BadRequest("walletAddress is not a valid address".to_string()));
    }
    Ok(normalize_address(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_future_times_out() {
        let result: Result<()> = with_timeout(Duration::from_millis(10), "slow thing", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, AppError>(())
        })
        .await;
        assert!(matches!(result, Err(AppError::Timeout("slow thing"))));
    }

    #[tokio::test]
    async fn fast_future_passes_through() {
        let result = with_timeout(Duration::from_secs(1), "fast", async { Ok::<_, AppError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn require_wallet_validates_and_normalizes() {
        assert_eq!(
            require_wallet(Some(" 0xABCDEF0123456789ABCDEF0123456789ABCDEF01 ")).unwrap(),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
        assert!(matches!(require_wallet(None), Err(AppError::BadRequest(_))));
        assert!(matches!(require_wallet(Some("  ")), Err(AppError::BadRequest(_))));
        assert!(matches!(require_wallet(Some("0x12")), Err(AppError::BadRequest(_))));
    }
}
