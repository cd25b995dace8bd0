//! YouTube Authentication
//!
//! The provider authenticates with a single OAuth bearer access token handed
//! over at configuration time; it must carry the
//! `https://www.googleapis.com/auth/youtube` scope. Tokens are never refreshed
//! here; an expired or revoked token is reported back as an authentication
//! failure.

use std::fmt;

/// Environment variable consulted by the CLI when no token flag is given
pub const ACCESS_TOKEN_ENV: &str = "YOUTUBE_ACCESS_TOKEN";

/// Bearer access token
///
/// Security: `Debug` and `Display` never print the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token, rejecting empty or whitespace-only values
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// The raw token, for the Authorization header only
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<sensitive>)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<sensitive>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        assert!(AccessToken::new("").is_none());
        assert!(AccessToken::new("   \n").is_none());
    }

    #[test]
    fn test_token_is_trimmed() {
        let token = AccessToken::new("  ya29.abc \n").unwrap();
        assert_eq!(token.secret(), "ya29.abc");
    }

    #[test]
    fn test_token_never_printed() {
        let token = AccessToken::new("ya29.secret").unwrap();
        assert!(!format!("{:?}", token).contains("ya29"));
        assert!(!format!("{}", token).contains("ya29"));
    }
}
