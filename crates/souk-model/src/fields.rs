// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const NAME_MAX_LEN: usize = 160;
pub const SLUG_MAX_LEN: usize = 96;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PHONE_MAX_DIGITS: usize = 15;
pub const PHONE_MIN_DIGITS: usize = 7;
pub const SKU_MAX_LEN: usize = 64;
pub const DESCRIPTION_MAX_LEN: usize = 4000;
pub const IMAGE_URL_MAX_LEN: usize = 512;
pub const QTY_MAX: u32 = 999;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    Trimmed(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::Trimmed(name) => {
                write!(f, "{name} must not contain leading/trailing whitespace")
            }
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::InvalidFormat(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// Human-facing display names: product/category/vendor titles, customer names.
pub fn parse_name(field: &'static str, input: &str) -> Result<String, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty(field));
    }
    if input.trim() != input {
        return Err(ParseError::Trimmed(field));
    }
    if input.len() > NAME_MAX_LEN {
        return Err(ParseError::TooLong(field, NAME_MAX_LEN));
    }
    Ok(input.to_string())
}

pub fn parse_description(input: &str) -> Result<String, ParseError> {
    if input.trim() != input {
        return Err(ParseError::Trimmed("description"));
    }
    if input.len() > DESCRIPTION_MAX_LEN {
        return Err(ParseError::TooLong("description", DESCRIPTION_MAX_LEN));
    }
    Ok(input.to_string())
}

pub fn parse_qty(raw: u32) -> Result<u32, ParseError> {
    if raw == 0 {
        return Err(ParseError::InvalidFormat("qty must be >= 1"));
    }
    if raw > QTY_MAX {
        return Err(ParseError::InvalidFormat("qty exceeds the per-line cap"));
    }
    Ok(raw)
}

pub fn parse_image_url(input: &str) -> Result<String, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty("image_url"));
    }
    if input.trim() != input {
        return Err(ParseError::Trimmed("image_url"));
    }
    if input.len() > IMAGE_URL_MAX_LEN {
        return Err(ParseError::TooLong("image_url", IMAGE_URL_MAX_LEN));
    }
    if !input.starts_with("https://") && !input.starts_with("http://") {
        return Err(ParseError::InvalidFormat(
            "image_url must start with http:// or https://",
        ));
    }
    Ok(input.to_string())
}

/// URL path segment: lowercase ascii alphanumerics separated by single dashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct Slug(String);

impl Slug {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("slug"));
        }
        if input.len() > SLUG_MAX_LEN {
            return Err(ParseError::TooLong("slug", SLUG_MAX_LEN));
        }
        if input.starts_with('-') || input.ends_with('-') || input.contains("--") {
            return Err(ParseError::InvalidFormat(
                "slug must not have leading/trailing/doubled dashes",
            ));
        }
        if !input
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ParseError::InvalidFormat(
                "slug must contain only lowercase letters, digits, and dashes",
            ));
        }
        Ok(Self(input.to_string()))
    }

    /// Derives a slug from free text: alphanumeric runs lowercased and joined
    /// by single dashes, truncated to the length cap at a dash boundary.
    pub fn from_text(input: &str) -> Result<Self, ParseError> {
        let mut out = String::new();
        let mut pending_dash = false;
        for c in input.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        while out.len() > SLUG_MAX_LEN {
            match out.rfind('-') {
                Some(at) => out.truncate(at),
                None => out.truncate(SLUG_MAX_LEN),
            }
        }
        Self::parse(&out)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalizes to ascii lowercase; shape check only, no deliverability probe.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("email"));
        }
        if input.trim() != input {
            return Err(ParseError::Trimmed("email"));
        }
        if input.len() > EMAIL_MAX_LEN {
            return Err(ParseError::TooLong("email", EMAIL_MAX_LEN));
        }
        let Some((local, domain)) = input.split_once('@') else {
            return Err(ParseError::InvalidFormat("email must contain '@'"));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(ParseError::InvalidFormat(
                "email local and domain parts must be non-empty",
            ));
        }
        if domain.contains('@') {
            return Err(ParseError::InvalidFormat("email must contain a single '@'"));
        }
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(ParseError::InvalidFormat(
                "email domain must be dot-separated with non-empty labels",
            ));
        }
        if input.chars().any(char::is_whitespace) {
            return Err(ParseError::InvalidFormat("email must not contain whitespace"));
        }
        Ok(Self(input.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("phone"));
        }
        if input.trim() != input {
            return Err(ParseError::Trimmed("phone"));
        }
        let digits = input.strip_prefix('+').unwrap_or(input);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseError::InvalidFormat(
                "phone must be digits with an optional leading '+'",
            ));
        }
        if digits.len() < PHONE_MIN_DIGITS || digits.len() > PHONE_MAX_DIGITS {
            return Err(ParseError::InvalidFormat(
                "phone must have between 7 and 15 digits",
            ));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct Sku(String);

impl Sku {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("sku"));
        }
        if input.trim() != input {
            return Err(ParseError::Trimmed("sku"));
        }
        if input.len() > SKU_MAX_LEN {
            return Err(ParseError::TooLong("sku", SKU_MAX_LEN));
        }
        if !input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ParseError::InvalidFormat(
                "sku must contain only alphanumerics, dashes, and underscores",
            ));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Sku {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_text_collapses_separators() {
        let slug = Slug::from_text("  Hand-Woven  Rug (Large) ").expect("slug");
        assert_eq!(slug.as_str(), "hand-woven-rug-large");
    }

    #[test]
    fn slug_rejects_uppercase_and_doubled_dashes() {
        assert!(Slug::parse("Rug").is_err());
        assert!(Slug::parse("hand--woven").is_err());
        assert!(Slug::parse("-rug").is_err());
    }

    #[test]
    fn email_normalizes_to_lowercase() {
        let email = EmailAddress::parse("Aisha@Example.COM").expect("email");
        assert_eq!(email.as_str(), "aisha@example.com");
    }

    #[test]
    fn email_rejects_missing_domain_dot() {
        assert!(EmailAddress::parse("a@localhost").is_err());
        assert!(EmailAddress::parse("a@.com").is_err());
        assert!(EmailAddress::parse("a@b@c.com").is_err());
    }

    #[test]
    fn phone_accepts_plus_prefix_within_digit_bounds() {
        assert!(PhoneNumber::parse("+14155550123").is_ok());
        assert!(PhoneNumber::parse("041555").is_err());
        assert!(PhoneNumber::parse("+1415555o123").is_err());
    }

    #[test]
    fn qty_bounds_are_enforced() {
        assert!(parse_qty(0).is_err());
        assert_eq!(parse_qty(1), Ok(1));
        assert!(parse_qty(QTY_MAX + 1).is_err());
    }
}
