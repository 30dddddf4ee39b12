//! Structured address parsing for providers that require it.

use crate::error::{RelayError, RelayResult};

/// Email address with optional display name.
///
/// Parsed from the raw header strings the relay collects. Providers that
/// accept raw strings never touch this type; providers that require
/// `(display-name, address)` pairs parse every address field through it and
/// treat any malformed field as a hard error for the whole send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name (e.g., "John Doe").
    pub name: Option<String>,
    /// Email address (e.g., "john@example.com").
    pub email: String,
}

impl Address {
    /// Parses an address from `"Name <addr>"` or a bare address string.
    ///
    /// `field` names the message field being parsed and is carried into the
    /// error so the caller's log says which address was malformed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use smtp_relay::providers::Address;
    ///
    /// let addr = Address::parse("to", "John Doe <john@example.com>").unwrap();
    /// assert_eq!(addr.name.as_deref(), Some("John Doe"));
    /// assert_eq!(addr.email, "john@example.com");
    ///
    /// let bare = Address::parse("to", "john@example.com").unwrap();
    /// assert_eq!(bare.name, None);
    /// ```
    pub fn parse(field: &'static str, raw: &str) -> RelayResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RelayError::address_format(field, "empty address"));
        }

        // "Name <email>" format
        if let Some(start) = raw.find('<') {
            let Some(end) = raw.rfind('>') else {
                return Err(RelayError::address_format(
                    field,
                    format!("unclosed angle bracket in {raw:?}"),
                ));
            };
            if end < start {
                return Err(RelayError::address_format(
                    field,
                    format!("mismatched angle brackets in {raw:?}"),
                ));
            }
            let name = raw[..start].trim().trim_matches('"');
            let email = raw[start + 1..end].trim();
            Self::validate_email(field, email)?;
            return Ok(Self {
                name: (!name.is_empty()).then(|| name.to_string()),
                email: email.to_string(),
            });
        }

        // Bare address
        Self::validate_email(field, raw)?;
        Ok(Self {
            name: None,
            email: raw.to_string(),
        })
    }

    fn validate_email(field: &'static str, email: &str) -> RelayResult<()> {
        if email.is_empty() {
            return Err(RelayError::address_format(field, "empty address"));
        }
        let at_count = email.chars().filter(|c| *c == '@').count();
        if at_count != 1 {
            return Err(RelayError::address_format(
                field,
                format!("address {email:?} must contain exactly one @"),
            ));
        }
        let (local, domain) = email.split_once('@').unwrap_or(("", ""));
        if local.is_empty() || domain.is_empty() {
            return Err(RelayError::address_format(
                field,
                format!("address {email:?} has an empty local part or domain"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_display_name_form() {
        let addr = Address::parse("from", "Jane Doe <jane@example.com>").unwrap();
        assert_eq!(addr.name.as_deref(), Some("Jane Doe"));
        assert_eq!(addr.email, "jane@example.com");
    }

    #[test]
    fn parses_quoted_display_name() {
        let addr = Address::parse("from", "\"Doe, Jane\" <jane@example.com>").unwrap();
        assert_eq!(addr.name.as_deref(), Some("Doe, Jane"));
    }

    #[test]
    fn parses_bare_address() {
        let addr = Address::parse("to", "b@y.com").unwrap();
        assert_eq!(addr.name, None);
        assert_eq!(addr.email, "b@y.com");
    }

    #[test]
    fn empty_display_name_becomes_none() {
        let addr = Address::parse("to", "<b@y.com>").unwrap();
        assert_eq!(addr.name, None);
        assert_eq!(addr.email, "b@y.com");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("no-at-sign")]
    #[case("two@@signs")]
    #[case("a@b@c")]
    #[case("@missing-local")]
    #[case("missing-domain@")]
    #[case("Jane <jane@example.com")]
    #[case("> <@")]
    fn rejects_malformed_addresses(#[case] raw: &str) {
        let err = Address::parse("cc", raw).unwrap_err();
        assert!(
            matches!(err, RelayError::AddressFormat { field: "cc", .. }),
            "unexpected error for {raw:?}: {err}"
        );
    }
}
