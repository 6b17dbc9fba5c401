//! Tag-length-value fields in the EMVCo Merchant Presented Mode layout.
//!
//! Every data object is written as a two-digit tag, a two-digit decimal
//! length, then the value itself:
//!
//! ```text
//! 00 02 01        -> "000201"
//! 53 03 764       -> "5303764"
//! ```
//!
//! Nested (template) fields such as merchant account information are just
//! fields whose value is the concatenation of encoded inner fields; see
//! [`TlvField::composite`].

use core::fmt;

use serde::Serialize;

use crate::error::{PromptPayError, Result};

/// Longest value a two-digit length prefix can describe.
pub const MAX_VALUE_LEN: usize = 99;

/// Characters taken by the tag and length prefix of every field.
pub const HEADER_LEN: usize = 4;

/// A single encodable data object.
///
/// The length is never stored: it is derived from `value` whenever the
/// field is encoded, so the declared and actual lengths cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TlvField {
    /// Two ASCII digits identifying the field.
    tag: String,
    /// Field contents, at most [`MAX_VALUE_LEN`] characters.
    value: String,
}

impl TlvField {
    /// Creates a field after checking the tag and value length.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::InvalidTag`] if `tag` is not two ASCII
    /// digits, or [`PromptPayError::FieldTooLong`] if `value` is longer
    /// than 99 characters.
    #[inline]
    pub fn new<T: Into<String>, V: Into<String>>(tag: T, value: V) -> Result<Self> {
        let owned_tag = tag.into();
        let owned_value = value.into();
        validate_tag(&owned_tag)?;
        let len = owned_value.chars().count();
        if len > MAX_VALUE_LEN {
            return Err(PromptPayError::FieldTooLong {
                tag: owned_tag,
                len,
            });
        }
        Ok(Self {
            tag: owned_tag,
            value: owned_value,
        })
    }

    /// Creates a template field whose value is the encoding of `inner`,
    /// in order.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TlvField::new`], applied to the outer field.
    ///
    /// ```
    /// use promptpay_rs::tlv::TlvField;
    ///
    /// let inner = [
    ///     TlvField::new("00", "A000000677010111")?,
    ///     TlvField::new("01", "0066812345678")?,
    /// ];
    /// let outer = TlvField::composite("29", &inner)?;
    /// assert_eq!(outer.encode(), "29370016A00000067701011101130066812345678");
    /// # Ok::<(), promptpay_rs::error::PromptPayError>(())
    /// ```
    #[inline]
    pub fn composite<T: Into<String>>(tag: T, inner: &[Self]) -> Result<Self> {
        let value: String = inner.iter().map(Self::encode).collect();
        Self::new(tag, value)
    }

    /// Returns the two-digit tag.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the value length in characters.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    /// Returns `true` if the value is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Returns `tag + two-digit length + value`.
    #[inline]
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}{:02}{}", self.tag, self.len(), self.value)
    }

    /// Decodes the value as a sequence of nested fields.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::MalformedPayload`] if the value is not
    /// itself valid TLV. Offsets are relative to the start of the value.
    #[inline]
    pub fn nested(&self) -> Result<Vec<Self>> {
        decode(&self.value)
    }
}

impl fmt::Display for TlvField {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}{}", self.tag, self.len(), self.value)
    }
}

/// Encodes a single field as `tag + two-digit length + value`.
///
/// # Errors
///
/// Returns [`PromptPayError::InvalidTag`] or
/// [`PromptPayError::FieldTooLong`] as described on [`TlvField::new`].
///
/// ```
/// assert_eq!(promptpay_rs::tlv::encode("53", "764")?, "5303764");
/// # Ok::<(), promptpay_rs::error::PromptPayError>(())
/// ```
#[inline]
pub fn encode(tag: &str, value: &str) -> Result<String> {
    TlvField::new(tag, value).map(|field| field.encode())
}

/// Splits a TLV string into its top-level fields.
///
/// # Errors
///
/// Returns [`PromptPayError::MalformedPayload`] on a truncated header, a
/// non-numeric tag or length, or a value that runs past the end of the
/// input.
#[inline]
pub fn decode(input: &str) -> Result<Vec<TlvField>> {
    let mut fields = Vec::new();
    let mut rest = input;
    let mut offset = 0;

    while !rest.is_empty() {
        let (header, after_header) = split_chars(rest, HEADER_LEN)
            .ok_or_else(|| malformed(offset, "truncated field header"))?;
        let (tag, digits) =
            split_chars(header, 2).ok_or_else(|| malformed(offset, "truncated field header"))?;
        if validate_tag(tag).is_err() {
            return Err(malformed(offset, format!("invalid tag {tag:?}")));
        }
        let len = parse_length(digits)
            .ok_or_else(|| malformed(offset, format!("invalid length {digits:?} for tag {tag}")))?;
        let (value, remainder) = split_chars(after_header, len).ok_or_else(|| {
            malformed(
                offset + HEADER_LEN,
                format!("value of tag {tag} runs past the end of input"),
            )
        })?;

        tracing::trace!(tag = %tag, len, "decoded field");
        fields.push(TlvField {
            tag: tag.to_owned(),
            value: value.to_owned(),
        });
        offset += HEADER_LEN + len;
        rest = remainder;
    }

    Ok(fields)
}

/// Checks that a tag is exactly two ASCII digits.
pub(crate) fn validate_tag(tag: &str) -> Result<()> {
    if tag.len() == 2 && tag.bytes().all(|byte| byte.is_ascii_digit()) {
        Ok(())
    } else {
        Err(PromptPayError::InvalidTag(tag.to_owned()))
    }
}

/// Parses a two-digit decimal length prefix.
fn parse_length(digits: &str) -> Option<usize> {
    if digits.len() == 2 && digits.bytes().all(|byte| byte.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

/// Splits off the first `count` characters, or returns `None` if the
/// input is shorter than that.
fn split_chars(input: &str, count: usize) -> Option<(&str, &str)> {
    let end = match input.char_indices().nth(count) {
        Some((idx, _)) => idx,
        None if input.chars().count() == count => input.len(),
        None => return None,
    };
    input.split_at_checked(end)
}

/// Builds a [`PromptPayError::MalformedPayload`].
fn malformed<R: Into<String>>(offset: usize, reason: R) -> PromptPayError {
    PromptPayError::MalformedPayload {
        offset,
        reason: reason.into(),
    }
}
