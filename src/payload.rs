//! Merchant Presented Mode payload assembly and verification.
//!
//! A payload is a flat run of TLV fields in a fixed order, ending with the
//! `63` checksum field:
//!
//! ```text
//! 00 02 01                      payload format indicator
//! 01 02 11|12                   point of initiation (static | dynamic)
//! 29 37 0016A000000677010111    merchant account information (template)
//!       0113 0066812345678
//! 58 02 TH                      country code (if configured)
//! 53 03 764                     transaction currency
//! 54 06 125.00                  transaction amount (dynamic only)
//! 63 04 3553                    CRC16 over everything before "3553"
//! ```

use core::fmt;
use core::str::FromStr;

use crate::crc;
use crate::error::{PromptPayError, Result};
use crate::models::{IdentifierKind, MonetaryAmount, PayeeIdentifier, PointOfInitiation};
use crate::scheme::{GUID_SUB_TAG, SchemeConfig};
use crate::tlv::{self, TlvField};

/// Root-level tags.
mod tags {
    /// Payload format indicator.
    pub(super) const PAYLOAD_FORMAT_INDICATOR: &str = "00";
    /// Point of initiation method.
    pub(super) const POINT_OF_INITIATION: &str = "01";
    /// Transaction currency.
    pub(super) const TRANSACTION_CURRENCY: &str = "53";
    /// Transaction amount.
    pub(super) const TRANSACTION_AMOUNT: &str = "54";
    /// Country code.
    pub(super) const COUNTRY_CODE: &str = "58";
    /// CRC checksum.
    pub(super) const CRC: &str = "63";
}

/// Payload format version carried in tag `00`.
const PAYLOAD_FORMAT_VERSION: &str = "01";

/// Checksum value width in hex digits.
const CHECKSUM_LEN: usize = 4;

/// A complete payment payload string and the fields it was built from.
///
/// Immutable; build one with [`Payload::builder`] or [`Payload::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Top-level fields in payload order, checksum last.
    fields: Vec<TlvField>,
    /// Concatenated encoding of `fields`.
    encoded: String,
}

impl Payload {
    /// Starts a builder targeting PromptPay.
    #[inline]
    #[must_use]
    pub fn builder() -> PayloadBuilder {
        PayloadBuilder::default()
    }

    /// Assembles a payload for an already-normalized payee.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::InvalidConfig`] or
    /// [`PromptPayError::InvalidTag`] if `scheme` fails
    /// [`SchemeConfig::validate`], [`PromptPayError::UnsupportedKind`] if it
    /// has no slot for the payee's kind, [`PromptPayError::InvalidIdentifier`] if the
    /// identifier does not fit the slot, or
    /// [`PromptPayError::FieldTooLong`] / [`PromptPayError::InvalidTag`] if
    /// any field cannot be encoded.
    #[inline]
    #[tracing::instrument(skip_all, fields(kind = %payee.kind(), dynamic = amount.is_some()))]
    pub fn assemble(
        scheme: &SchemeConfig,
        payee: &PayeeIdentifier,
        amount: Option<MonetaryAmount>,
    ) -> Result<Self> {
        scheme.validate()?;
        let slot = scheme.slot(payee.kind())?;
        let initiation = PointOfInitiation::for_amount(amount.is_some());

        let merchant_account = TlvField::composite(
            scheme.merchant_account_tag.as_str(),
            &[
                TlvField::new(GUID_SUB_TAG, scheme.guid.as_str())?,
                TlvField::new(slot.sub_tag.as_str(), payee.field_value(slot)?)?,
            ],
        )?;

        let mut fields = vec![
            TlvField::new(tags::PAYLOAD_FORMAT_INDICATOR, PAYLOAD_FORMAT_VERSION)?,
            TlvField::new(tags::POINT_OF_INITIATION, initiation.code())?,
            merchant_account,
        ];
        if let Some(country) = scheme.country_code.as_deref() {
            fields.push(TlvField::new(tags::COUNTRY_CODE, country)?);
        }
        fields.push(TlvField::new(
            tags::TRANSACTION_CURRENCY,
            scheme.currency_code.as_str(),
        )?);
        if let Some(value) = amount {
            fields.push(TlvField::new(tags::TRANSACTION_AMOUNT, value.formatted())?);
        }

        // The checksum covers its own tag and length but not its value.
        let mut encoded: String = fields.iter().map(TlvField::encode).collect();
        encoded.push_str(&checksum_header());
        let checksum = crc::checksum(&encoded);
        encoded.push_str(&checksum);
        fields.push(TlvField::new(tags::CRC, checksum)?);

        tracing::debug!(fields = fields.len(), len = encoded.len(), "assembled payload");
        Ok(Self { fields, encoded })
    }

    /// Parses a payload string, verifying its structure and checksum.
    ///
    /// Surrounding whitespace is ignored and the carried checksum is
    /// compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::MissingChecksum`] if the input does not
    /// end with a `6304` field, [`PromptPayError::ChecksumMismatch`] if
    /// the checksum is wrong, or [`PromptPayError::MalformedPayload`] if
    /// the fields cannot be decoded or are out of place.
    #[inline]
    #[tracing::instrument(skip_all, fields(len = input.len()))]
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (body, carried) = trimmed
            .char_indices()
            .rev()
            .nth(CHECKSUM_LEN - 1)
            .and_then(|(idx, _)| trimmed.split_at_checked(idx))
            .ok_or(PromptPayError::MissingChecksum)?;
        if !body.ends_with(&checksum_header()) {
            return Err(PromptPayError::MissingChecksum);
        }

        let expected = crc::checksum(body);
        if !carried.eq_ignore_ascii_case(&expected) {
            tracing::debug!(expected = %expected, actual = %carried, "checksum mismatch");
            return Err(PromptPayError::ChecksumMismatch {
                expected,
                actual: carried.to_owned(),
            });
        }

        let fields = tlv::decode(trimmed)?;
        check_layout(&fields)?;
        tracing::debug!(fields = fields.len(), "parsed payload");
        Ok(Self {
            fields,
            encoded: trimmed.to_owned(),
        })
    }

    /// Returns the payload string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Consumes the payload and returns the string.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.encoded
    }

    /// Returns the top-level fields in order, checksum last.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[TlvField] {
        &self.fields
    }

    /// Returns the first top-level field with `tag`.
    #[inline]
    #[must_use]
    pub fn field(&self, tag: &str) -> Option<&TlvField> {
        self.fields.iter().find(|field| field.tag() == tag)
    }

    /// Returns the four hex digits of the checksum field.
    #[inline]
    #[must_use]
    pub fn checksum(&self) -> &str {
        self.field(tags::CRC).map_or("", TlvField::value)
    }

    /// Returns the point of initiation, if present and recognised.
    #[inline]
    #[must_use]
    pub fn point_of_initiation(&self) -> Option<PointOfInitiation> {
        self.field(tags::POINT_OF_INITIATION)
            .and_then(|field| PointOfInitiation::from_code(field.value()))
    }

    /// Returns the encoded transaction amount, if the payload is dynamic.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> Option<&str> {
        self.field(tags::TRANSACTION_AMOUNT).map(TlvField::value)
    }

    /// Returns the transaction currency code.
    #[inline]
    #[must_use]
    pub fn currency(&self) -> Option<&str> {
        self.field(tags::TRANSACTION_CURRENCY).map(TlvField::value)
    }

    /// Decodes the merchant account information template under `tag`.
    ///
    /// Returns `Ok(None)` if the payload has no such field.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::MalformedPayload`] if the template value
    /// is not valid TLV.
    #[inline]
    pub fn merchant_account(&self, tag: &str) -> Result<Option<Vec<TlvField>>> {
        self.field(tag).map(TlvField::nested).transpose()
    }
}

impl fmt::Display for Payload {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl AsRef<str> for Payload {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.encoded
    }
}

impl FromStr for Payload {
    type Err = PromptPayError;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Builder for [`Payload`].
///
/// ```
/// use promptpay_rs::models::{IdentifierKind, MonetaryAmount};
/// use promptpay_rs::payload::Payload;
///
/// let payload = Payload::builder()
///     .identifier("081-234-5678", IdentifierKind::Phone)
///     .amount(MonetaryAmount::new(125.0)?)
///     .build()?;
/// assert!(payload.as_str().ends_with("63043553"));
/// # Ok::<(), promptpay_rs::error::PromptPayError>(())
/// ```
#[derive(Debug, Default)]
pub struct PayloadBuilder {
    /// Scheme constants (PromptPay unless overridden).
    scheme: SchemeConfig,
    /// Identifier as supplied.
    raw: Option<String>,
    /// Identifier kind; guessed from the digits when absent.
    kind: Option<IdentifierKind>,
    /// Locked amount, for dynamic payloads.
    amount: Option<MonetaryAmount>,
}

impl PayloadBuilder {
    /// Targets a different scheme.
    #[inline]
    #[must_use]
    pub fn scheme(mut self, scheme: SchemeConfig) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the payee identifier and its kind.
    #[inline]
    #[must_use]
    pub fn identifier<T: Into<String>>(mut self, raw: T, kind: IdentifierKind) -> Self {
        self.raw = Some(raw.into());
        self.kind = Some(kind);
        self
    }

    /// Sets the payee identifier and lets its kind be detected from the
    /// digit count.
    #[inline]
    #[must_use]
    pub fn detect_identifier<T: Into<String>>(mut self, raw: T) -> Self {
        self.raw = Some(raw.into());
        self.kind = None;
        self
    }

    /// Locks the payload to an amount.
    #[inline]
    #[must_use]
    pub const fn amount(mut self, amount: MonetaryAmount) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Normalizes the identifier and assembles the payload.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::InvalidIdentifier`] if no identifier was
    /// set or it has no digits, and any error from [`Payload::assemble`].
    #[inline]
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> Result<Payload> {
        let raw = self
            .raw
            .ok_or_else(|| PromptPayError::InvalidIdentifier {
                reason: "no payee identifier was supplied".to_owned(),
            })?;
        let payee = match self.kind {
            Some(kind) => PayeeIdentifier::new(raw, kind, &self.scheme)?,
            None => PayeeIdentifier::detect(raw, &self.scheme)?,
        };
        Payload::assemble(&self.scheme, &payee, self.amount)
    }
}

/// Builds a PromptPay payload string in one call.
///
/// # Errors
///
/// Returns [`PromptPayError::InvalidAmount`] for a negative or non-finite
/// amount, and any error from [`PayloadBuilder::build`].
///
/// ```
/// use promptpay_rs::models::IdentifierKind;
///
/// let payload = promptpay_rs::generate("0812345678", IdentifierKind::Phone, None)?;
/// assert!(payload.starts_with("000201010211"));
/// # Ok::<(), promptpay_rs::error::PromptPayError>(())
/// ```
#[inline]
pub fn generate(raw: &str, kind: IdentifierKind, amount: Option<f64>) -> Result<String> {
    let mut builder = Payload::builder().identifier(raw, kind);
    if let Some(value) = amount {
        builder = builder.amount(MonetaryAmount::new(value)?);
    }
    builder.build().map(Payload::into_string)
}

/// Tag and length of the checksum field, `"6304"`.
fn checksum_header() -> String {
    format!("{}{CHECKSUM_LEN:02}", tags::CRC)
}

/// Checks the decoded field order: format indicator first, a single
/// checksum field last.
fn check_layout(fields: &[TlvField]) -> Result<()> {
    if fields
        .first()
        .is_none_or(|first| first.tag() != tags::PAYLOAD_FORMAT_INDICATOR)
    {
        return Err(PromptPayError::MalformedPayload {
            offset: 0,
            reason: "payload must start with the payload format indicator".to_owned(),
        });
    }
    let checksum_fields = fields
        .iter()
        .filter(|field| field.tag() == tags::CRC)
        .count();
    let last_is_checksum = fields
        .last()
        .is_some_and(|last| last.tag() == tags::CRC && last.len() == CHECKSUM_LEN);
    if checksum_fields != 1 || !last_is_checksum {
        let offset = fields
            .iter()
            .take_while(|field| field.tag() != tags::CRC)
            .map(|field| tlv::HEADER_LEN + field.len())
            .sum();
        return Err(PromptPayError::MalformedPayload {
            offset,
            reason: "checksum field must appear exactly once, as the final field".to_owned(),
        });
    }
    Ok(())
}
