//! Bearer token types

use serde::{Deserialize, Serialize};

/// Kind of bearer token
///
/// Embedded in the signed payload (`typ` claim) so an access token can never stand in
/// for a renewal token or the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Short-lived token presented on every API call
    #[serde(rename = "ACCESS")]
    Access,
    /// Long-lived token used only to obtain a fresh access/renewal pair
    #[serde(rename = "REFRESH")]
    Renewal,
}

impl TokenType {
    /// Wire value carried in the `typ` claim
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "ACCESS",
            Self::Renewal => "REFRESH",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenType {
    type Err = TokenTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCESS" => Ok(Self::Access),
            "REFRESH" => Ok(Self::Renewal),
            _ => Err(TokenTypeParseError(s.to_string())),
        }
    }
}

/// Error parsing a token type string
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown token type: {0}")]
pub struct TokenTypeParseError(pub String);
