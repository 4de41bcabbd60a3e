use std::fmt;

/// Hosted-model API key.
///
/// Held in memory only: not `Serialize`, and both `Debug` and `Display`
/// print a redacted form so the key cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting blank input
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// Read the key from `ZHIPUAI_API_KEY`
    pub fn from_env() -> Option<Self> {
        std::env::var("ZHIPUAI_API_KEY").ok().and_then(Self::new)
    }

    /// The raw key, for building the `Authorization` header only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_rejected() {
        assert!(ApiKey::new("").is_none());
        assert!(ApiKey::new("   ").is_none());
    }

    #[test]
    fn test_key_is_trimmed_and_redacted() {
        let key = ApiKey::new(" abc.def \n").unwrap();
        assert_eq!(key.expose(), "abc.def");
        assert_eq!(format!("{key}"), "***");
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
    }
}
