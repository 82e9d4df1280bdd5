/// Canonical form of an EVM wallet address: trimmed and lower-cased.
///
/// Every comparison, store key and token claim uses this form. Applying it
/// twice yields the same string.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// `0x` followed by exactly 40 hex digits, in any case.
pub fn is_valid_address(address: &str) -> bool {
    let trimmed = address.trim();
    let Some(body) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    else {
        return false;
    };
    body.len() == 40 && body.chars().all(|c| c.is_ascii_hexdigit())
}
