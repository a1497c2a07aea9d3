//! Static token allow-list.

use subtle::ConstantTimeEq;

/// Set of tokens permitted for point queries, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    tokens: Vec<String>,
}

impl AllowList {
    /// Builds the allow-list, dropping blanks and duplicates.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for token in tokens {
            let token = token.into();
            let token = token.trim();
            if !token.is_empty() && !list.iter().any(|t| t == token) {
                list.push(token.to_string());
            }
        }
        Self { tokens: list }
    }

    /// Checks membership.
    ///
    /// Every entry is compared with `subtle::ConstantTimeEq` so the time taken
    /// does not depend on how much of a candidate matches.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        let candidate = token.as_bytes();
        self.tokens
            .iter()
            .fold(false, |found, t| found | bool::from(t.as_bytes().ct_eq(candidate)))
    }

    /// Number of distinct tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when no token is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
