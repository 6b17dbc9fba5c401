//! Payee identifier model and normalization.

use crate::error::{PromptPayError, Result};
use crate::scheme::{IdentifierSlot, SchemeConfig};

use super::IdentifierKind;

/// Who receives the funds, normalized for the payment scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayeeIdentifier {
    /// How the scheme addresses this payee.
    kind: IdentifierKind,
    /// Identifier as supplied, separators included.
    raw: String,
    /// ASCII digits only, country code applied for phones.
    normalized: String,
}

impl PayeeIdentifier {
    /// Normalizes `raw` for the given kind under `scheme`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::UnsupportedKind`] if the scheme has no
    /// slot for `kind`, or [`PromptPayError::InvalidIdentifier`] if `raw`
    /// contains no digits.
    #[inline]
    pub fn new<R: Into<String>>(
        raw: R,
        kind: IdentifierKind,
        scheme: &SchemeConfig,
    ) -> Result<Self> {
        let _slot = scheme.slot(kind)?;
        let owned_raw = raw.into();
        let normalized = normalize(
            &owned_raw,
            kind,
            &scheme.trunk_prefix,
            &scheme.country_calling_code,
        )?;
        Ok(Self {
            kind,
            raw: owned_raw,
            normalized,
        })
    }

    /// Like [`PayeeIdentifier::new`], with the kind guessed from the digit
    /// count (see [`IdentifierKind::detect`]).
    ///
    /// # Errors
    ///
    /// Same as [`PayeeIdentifier::new`].
    #[inline]
    pub fn detect<R: Into<String>>(raw: R, scheme: &SchemeConfig) -> Result<Self> {
        let owned_raw = raw.into();
        let kind = IdentifierKind::detect(&owned_raw);
        Self::new(owned_raw, kind, scheme)
    }

    /// Returns the identifier kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// Returns the identifier as originally supplied.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the digits-only form.
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Returns the value to place under the slot's sub-tag, zero-padded on
    /// the left when the slot has a fixed width.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::InvalidIdentifier`] if the normalized
    /// digits do not fit the slot width.
    pub(crate) fn field_value(&self, slot: &IdentifierSlot) -> Result<String> {
        let Some(width) = slot.width else {
            return Ok(self.normalized.clone());
        };
        if self.normalized.len() > width {
            return Err(PromptPayError::InvalidIdentifier {
                reason: format!(
                    "{} identifier has {} digits, at most {width} fit",
                    self.kind,
                    self.normalized.len()
                ),
            });
        }
        Ok(format!("{:0>width$}", self.normalized))
    }
}

/// Reduces an identifier to ASCII digits.
///
/// For [`IdentifierKind::Phone`] a leading `trunk_prefix` is replaced by
/// `country_code`; other kinds pass through unchanged.
///
/// # Errors
///
/// Returns [`PromptPayError::InvalidIdentifier`] if no digits remain.
///
/// ```
/// use promptpay_rs::models::{IdentifierKind, normalize};
///
/// assert_eq!(normalize("081-234-5678", IdentifierKind::Phone, "0", "66")?, "66812345678");
/// assert_eq!(normalize("0105", IdentifierKind::NationalId, "0", "66")?, "0105");
/// # Ok::<(), promptpay_rs::error::PromptPayError>(())
/// ```
#[inline]
pub fn normalize(
    raw: &str,
    kind: IdentifierKind,
    trunk_prefix: &str,
    country_code: &str,
) -> Result<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(PromptPayError::InvalidIdentifier {
            reason: format!("{kind} identifier contains no digits"),
        });
    }

    match kind {
        IdentifierKind::Phone if !trunk_prefix.is_empty() => {
            Ok(digits.strip_prefix(trunk_prefix).map_or_else(
                || digits.clone(),
                |national| format!("{country_code}{national}"),
            ))
        }
        IdentifierKind::Phone | IdentifierKind::NationalId | IdentifierKind::EWallet => {
            Ok(digits)
        }
    }
}
