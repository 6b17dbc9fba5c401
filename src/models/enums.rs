//! Enumeration types for constrained payload values.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PromptPayError;

/// Digit count of a Thai national/tax identifier.
const NATIONAL_ID_DIGITS: usize = 13;

/// Digit count of a PromptPay e-wallet identifier.
const E_WALLET_DIGITS: usize = 15;

/// How a payee is addressed by the payment scheme.
///
/// Each kind is carried under its own sub-tag inside the merchant account
/// information field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierKind {
    /// Mobile phone number.
    Phone,
    /// National (citizen) or tax identifier.
    NationalId,
    /// E-wallet identifier.
    EWallet,
}

impl IdentifierKind {
    /// Guesses the kind from an identifier's digit count: 13 digits is a
    /// national id, 15 an e-wallet id, anything else a phone number.
    ///
    /// Non-digit characters are ignored.
    #[inline]
    #[must_use]
    pub fn detect(raw: &str) -> Self {
        match raw.chars().filter(char::is_ascii_digit).count() {
            NATIONAL_ID_DIGITS => Self::NationalId,
            E_WALLET_DIGITS => Self::EWallet,
            _ => Self::Phone,
        }
    }

    /// Returns the canonical kebab-case name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::NationalId => "national-id",
            Self::EWallet => "e-wallet",
        }
    }
}

impl fmt::Display for IdentifierKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierKind {
    type Err = PromptPayError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phone" | "mobile" => Ok(Self::Phone),
            "national-id" | "national_id" | "tax-id" | "citizen-id" => Ok(Self::NationalId),
            "e-wallet" | "ewallet" => Ok(Self::EWallet),
            _ => Err(PromptPayError::UnsupportedKind(s.to_owned())),
        }
    }
}

/// Whether a payment code is reusable or bound to one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointOfInitiation {
    /// Reusable code without an amount; the payer enters one.
    Static,
    /// One-time code with the amount fixed.
    Dynamic,
}

impl PointOfInitiation {
    /// Picks the method implied by the presence of an amount.
    #[inline]
    #[must_use]
    pub const fn for_amount(has_amount: bool) -> Self {
        if has_amount { Self::Dynamic } else { Self::Static }
    }

    /// Returns the two-digit field value.
    #[inline]
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Static => "11",
            Self::Dynamic => "12",
        }
    }

    /// Maps a field value back to the method.
    #[inline]
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "11" => Some(Self::Static),
            "12" => Some(Self::Dynamic),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serde_roundtrip() {
        let variants = [
            (IdentifierKind::Phone, r#""phone""#),
            (IdentifierKind::NationalId, r#""national-id""#),
            (IdentifierKind::EWallet, r#""e-wallet""#),
        ];
        for (variant, expected_json) in variants {
            let json = serde_json::to_string(&variant).unwrap();
            assert_eq!(json, expected_json);
            let deserialized: IdentifierKind = serde_json::from_str(&json).unwrap();
            assert_eq!(deserialized, variant);
        }
    }

    #[test]
    fn kind_from_str_aliases() {
        assert_eq!("phone".parse::<IdentifierKind>().unwrap(), IdentifierKind::Phone);
        assert_eq!(" Mobile ".parse::<IdentifierKind>().unwrap(), IdentifierKind::Phone);
        assert_eq!(
            "tax-id".parse::<IdentifierKind>().unwrap(),
            IdentifierKind::NationalId
        );
        assert_eq!(
            "EWALLET".parse::<IdentifierKind>().unwrap(),
            IdentifierKind::EWallet
        );
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let err = "iban".parse::<IdentifierKind>().unwrap_err();
        assert!(matches!(&err, PromptPayError::UnsupportedKind(kind) if kind == "iban"));
    }

    #[test]
    fn display_matches_serde_name() {
        assert_eq!(IdentifierKind::NationalId.to_string(), "national-id");
        assert_eq!(
            IdentifierKind::EWallet.to_string().parse::<IdentifierKind>().unwrap(),
            IdentifierKind::EWallet
        );
    }

    #[test]
    fn detect_by_digit_count() {
        assert_eq!(IdentifierKind::detect("081-234-5678"), IdentifierKind::Phone);
        assert_eq!(
            IdentifierKind::detect("1-2345-67890-12-1"),
            IdentifierKind::NationalId
        );
        assert_eq!(
            IdentifierKind::detect("123456789012345"),
            IdentifierKind::EWallet
        );
        assert_eq!(IdentifierKind::detect(""), IdentifierKind::Phone);
    }

    #[test]
    fn point_of_initiation_codes() {
        assert_eq!(PointOfInitiation::for_amount(false).code(), "11");
        assert_eq!(PointOfInitiation::for_amount(true).code(), "12");
        assert_eq!(
            PointOfInitiation::from_code("12"),
            Some(PointOfInitiation::Dynamic)
        );
        assert_eq!(PointOfInitiation::from_code("13"), None);
    }
}
