/// Address matcher for comparing hex-encoded account addresses
pub struct AddressMatcher;

impl AddressMatcher {
    /// Check whether two addresses refer to the same account
    /// Comparison ignores case and an optional 0x/0X prefix; there is no prefix matching
    pub fn matches(a: &str, b: &str) -> bool {
        Self::normalize(a) == Self::normalize(b)
    }

    /// Return the first deny-list entry that matches `address`
    pub fn find_match<'a>(address: &str, candidates: &'a [String]) -> Option<&'a str> {
        let normalized = Self::normalize(address);
        candidates
            .iter()
            .find(|candidate| Self::normalize(candidate) == normalized)
            .map(String::as_str)
    }

    /// Normalize address to lowercase for consistent comparison
    /// Removes 0x prefix if present and converts to lowercase
    pub fn normalize(address: &str) -> String {
        let trimmed = address.trim();
        let without_prefix = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        without_prefix.to_lowercase()
    }
}
