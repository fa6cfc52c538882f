//! crates/recruitment_forms_core/src/token.rs
//!
//! Opaque public address of a published form.

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of alphanumeric characters in a token (~131 bits of entropy).
pub const TOKEN_LENGTH: usize = 22;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token must be {expected} characters long, got {0}", expected = TOKEN_LENGTH)]
    Length(usize),
    #[error("token must only contain ASCII letters and digits")]
    Charset,
}

/// Unguessable identifier under which a form is published. This, not the
/// campaign id, is the key of the public application page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AddressToken(String);

impl AddressToken {
    /// Draws a fresh token from the operating system's CSPRNG.
    pub fn generate() -> Self {
        let token: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        Self(token)
    }

    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let len = raw.chars().count();
        if len != TOKEN_LENGTH {
            return Err(TokenError::Length(len));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TokenError::Charset);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AddressToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AddressToken {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AddressToken> for String {
    fn from(token: AddressToken) -> Self {
        token.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_tokens_are_well_formed_and_distinct() {
        let tokens: HashSet<AddressToken> = (0..1000).map(|_| AddressToken::generate()).collect();
        assert_eq!(tokens.len(), 1000);
        for token in &tokens {
            assert_eq!(AddressToken::parse(token.as_str()).as_ref(), Ok(token));
        }
    }

    #[test]
    fn parse_rejects_short_or_symbolic_input() {
        assert_eq!(AddressToken::parse("abc"), Err(TokenError::Length(3)));
        assert_eq!(
            AddressToken::parse("abcdefghij-klmnopqrstu"),
            Err(TokenError::Charset)
        );
    }

    #[test]
    fn deserialization_validates_shape() {
        assert!(serde_json::from_str::<AddressToken>("\"short\"").is_err());
        let token = AddressToken::generate();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(serde_json::from_str::<AddressToken>(&json).unwrap(), token);
    }
}
