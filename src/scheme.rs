//! Payment scheme configuration.
//!
//! Every registered constant of the target scheme lives here rather than
//! in the assembler, so the same encoder can serve other EMVCo-derived
//! regional schemes by swapping configuration. [`SchemeConfig::default`]
//! is Thai PromptPay.
//!
//! Configurations are plain JSON (camelCase keys); missing keys fall back
//! to the PromptPay values:
//!
//! ```json
//! {
//!   "merchantAccountTag": "29",
//!   "guid": "A000000677010111",
//!   "phone": { "subTag": "01", "width": 13 },
//!   "nationalId": { "subTag": "02" },
//!   "eWallet": { "subTag": "03" },
//!   "trunkPrefix": "0",
//!   "countryCallingCode": "66",
//!   "countryCode": "TH",
//!   "currencyCode": "764"
//! }
//! ```

use std::fs;
use std::path::Path;
#[cfg(feature = "config-file")]
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PromptPayError, Result};
use crate::models::IdentifierKind;
use crate::tlv::{self, MAX_VALUE_LEN, TlvField};

/// Directory name under the platform config dir.
#[cfg(feature = "config-file")]
const APP_NAME: &str = "promptpay-rs";

/// File name of the scheme configuration.
#[cfg(feature = "config-file")]
const SCHEME_FILE: &str = "scheme.json";

/// Lowest tag EMVCo reserves for merchant account information.
const MERCHANT_ACCOUNT_TAG_MIN: u8 = 2;

/// Highest tag EMVCo reserves for merchant account information.
const MERCHANT_ACCOUNT_TAG_MAX: u8 = 51;

/// Sub-tag carrying the scheme GUID inside merchant account information.
pub(crate) const GUID_SUB_TAG: &str = "00";

/// Where and how one identifier kind is carried in merchant account
/// information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierSlot {
    /// Sub-tag under which the identifier is placed.
    pub sub_tag: String,
    /// Fixed width; shorter identifiers are left-padded with `'0'`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
}

impl IdentifierSlot {
    /// Creates a slot without a fixed width.
    #[inline]
    #[must_use]
    pub fn new<T: Into<String>>(sub_tag: T) -> Self {
        Self {
            sub_tag: sub_tag.into(),
            width: None,
        }
    }

    /// Sets a fixed width.
    #[inline]
    #[must_use]
    pub const fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }
}

/// Registered constants of a Merchant Presented Mode payment scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemeConfig {
    /// Outer tag of the merchant account information template (02–51).
    pub merchant_account_tag: String,
    /// Application identifier of the scheme, carried under sub-tag `00`.
    pub guid: String,
    /// Phone-number slot, if the scheme accepts phones.
    pub phone: Option<IdentifierSlot>,
    /// National/tax id slot, if the scheme accepts them.
    pub national_id: Option<IdentifierSlot>,
    /// E-wallet slot, if the scheme accepts them.
    pub e_wallet: Option<IdentifierSlot>,
    /// Local trunk prefix stripped from phone numbers.
    pub trunk_prefix: String,
    /// Country calling code that replaces the trunk prefix.
    pub country_calling_code: String,
    /// ISO 3166-1 alpha-2 country code (tag `58`), if emitted.
    pub country_code: Option<String>,
    /// ISO 4217 numeric currency code (tag `53`).
    pub currency_code: String,
}

impl Default for SchemeConfig {
    #[inline]
    fn default() -> Self {
        Self::promptpay()
    }
}

impl SchemeConfig {
    /// Thai PromptPay credit transfer.
    #[inline]
    #[must_use]
    pub fn promptpay() -> Self {
        Self {
            merchant_account_tag: "29".to_owned(),
            guid: "A000000677010111".to_owned(),
            phone: Some(IdentifierSlot::new("01").with_width(13)),
            national_id: Some(IdentifierSlot::new("02")),
            e_wallet: Some(IdentifierSlot::new("03")),
            trunk_prefix: "0".to_owned(),
            country_calling_code: "66".to_owned(),
            country_code: Some("TH".to_owned()),
            currency_code: "764".to_owned(),
        }
    }

    /// Returns the slot for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::UnsupportedKind`] if the scheme does not
    /// accept that kind.
    #[inline]
    pub fn slot(&self, kind: IdentifierKind) -> Result<&IdentifierSlot> {
        let slot = match kind {
            IdentifierKind::Phone => self.phone.as_ref(),
            IdentifierKind::NationalId => self.national_id.as_ref(),
            IdentifierKind::EWallet => self.e_wallet.as_ref(),
        };
        slot.ok_or_else(|| PromptPayError::UnsupportedKind(kind.to_string()))
    }

    /// Checks that every constant can be encoded.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::InvalidTag`] for malformed tags,
    /// [`PromptPayError::FieldTooLong`] for an oversized GUID, or
    /// [`PromptPayError::InvalidConfig`] for anything else.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        tlv::validate_tag(&self.merchant_account_tag)?;
        let outer: u8 = self
            .merchant_account_tag
            .parse()
            .map_err(|_err| PromptPayError::InvalidTag(self.merchant_account_tag.clone()))?;
        if !(MERCHANT_ACCOUNT_TAG_MIN..=MERCHANT_ACCOUNT_TAG_MAX).contains(&outer) {
            return Err(PromptPayError::InvalidConfig(format!(
                "merchant account tag {} is outside 02-51",
                self.merchant_account_tag
            )));
        }

        if self.guid.is_empty() {
            return Err(PromptPayError::InvalidConfig("guid is empty".to_owned()));
        }
        let _guid = TlvField::new(GUID_SUB_TAG, self.guid.as_str())?;

        let slots = [
            (IdentifierKind::Phone, self.phone.as_ref()),
            (IdentifierKind::NationalId, self.national_id.as_ref()),
            (IdentifierKind::EWallet, self.e_wallet.as_ref()),
        ];
        if slots.iter().all(|&(_, slot)| slot.is_none()) {
            return Err(PromptPayError::InvalidConfig(
                "no identifier slot is configured".to_owned(),
            ));
        }
        for (kind, slot) in slots {
            if let Some(configured) = slot {
                validate_slot(kind, configured)?;
            }
        }

        if !is_digits(&self.trunk_prefix) && !self.trunk_prefix.is_empty() {
            return Err(PromptPayError::InvalidConfig(format!(
                "trunk prefix {:?} is not numeric",
                self.trunk_prefix
            )));
        }
        if !is_digits(&self.country_calling_code) {
            return Err(PromptPayError::InvalidConfig(format!(
                "country calling code {:?} is not numeric",
                self.country_calling_code
            )));
        }
        if self.currency_code.len() != 3 || !is_digits(&self.currency_code) {
            return Err(PromptPayError::InvalidConfig(format!(
                "currency code {:?} is not three digits",
                self.currency_code
            )));
        }
        if let Some(country) = self.country_code.as_deref() {
            if country.len() != 2 || !country.bytes().all(|byte| byte.is_ascii_uppercase()) {
                return Err(PromptPayError::InvalidConfig(format!(
                    "country code {country:?} is not two uppercase letters"
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::Serialization`] for invalid JSON, or any
    /// error from [`SchemeConfig::validate`].
    #[inline]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::Io`] if the file cannot be read, or any
    /// error from [`SchemeConfig::from_json_str`].
    #[inline]
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::debug!("loading scheme configuration");
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Returns `$XDG_CONFIG_HOME/promptpay-rs/scheme.json` (or the
    /// platform equivalent).
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::ConfigDirUnavailable`] if the platform
    /// config directory cannot be determined.
    #[cfg(feature = "config-file")]
    #[inline]
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME).join(SCHEME_FILE))
            .ok_or(PromptPayError::ConfigDirUnavailable)
    }

    /// Loads the configuration at [`SchemeConfig::default_path`], or
    /// PromptPay if no such file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[cfg(feature = "config-file")]
    #[inline]
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Ok(path) if path.is_file() => Self::from_file(path),
            Ok(_) | Err(PromptPayError::ConfigDirUnavailable) => {
                tracing::debug!("no scheme configuration file, using PromptPay");
                Ok(Self::promptpay())
            }
            Err(err) => Err(err),
        }
    }
}

/// Checks one identifier slot.
fn validate_slot(kind: IdentifierKind, slot: &IdentifierSlot) -> Result<()> {
    tlv::validate_tag(&slot.sub_tag)?;
    if slot.sub_tag == GUID_SUB_TAG {
        return Err(PromptPayError::InvalidConfig(format!(
            "{kind} sub-tag collides with the GUID sub-tag {GUID_SUB_TAG}"
        )));
    }
    if slot.width.is_some_and(|width| width == 0 || width > MAX_VALUE_LEN) {
        return Err(PromptPayError::InvalidConfig(format!(
            "{kind} width must be between 1 and {MAX_VALUE_LEN}"
        )));
    }
    Ok(())
}

/// Returns `true` for a non-empty string of ASCII digits.
fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn promptpay_is_default_and_valid() {
        let config = SchemeConfig::default();
        assert_eq!(config, SchemeConfig::promptpay());
        config.validate().unwrap();
        assert_eq!(config.merchant_account_tag, "29");
        assert_eq!(config.guid, "A000000677010111");
        assert_eq!(config.currency_code, "764");
    }

    #[test]
    fn slots_by_kind() {
        let config = SchemeConfig::promptpay();
        assert_eq!(config.slot(IdentifierKind::Phone).unwrap().sub_tag, "01");
        assert_eq!(config.slot(IdentifierKind::Phone).unwrap().width, Some(13));
        assert_eq!(config.slot(IdentifierKind::NationalId).unwrap().sub_tag, "02");
        assert_eq!(config.slot(IdentifierKind::EWallet).unwrap().sub_tag, "03");
    }

    #[test]
    fn missing_slot_is_unsupported() {
        let config = SchemeConfig {
            e_wallet: None,
            ..SchemeConfig::promptpay()
        };
        let err = config.slot(IdentifierKind::EWallet).unwrap_err();
        assert!(matches!(&err, PromptPayError::UnsupportedKind(kind) if kind == "e-wallet"));
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_value(SchemeConfig::promptpay()).unwrap();
        assert_eq!(json["merchantAccountTag"], "29");
        assert_eq!(json["countryCallingCode"], "66");
        assert_eq!(json["phone"]["subTag"], "01");
        assert_eq!(json["phone"]["width"], 13);
        assert!(json["nationalId"].get("width").is_none());
    }

    #[test]
    fn serde_roundtrip_keeps_absent_country() {
        let config = SchemeConfig {
            country_code: None,
            ..SchemeConfig::promptpay()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SchemeConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn partial_json_falls_back_to_promptpay() {
        let config =
            SchemeConfig::from_json_str(r#"{"merchantAccountTag": "30", "countryCode": null}"#)
                .unwrap();
        assert_eq!(config.merchant_account_tag, "30");
        assert_eq!(config.country_code, None);
        assert_eq!(config.guid, "A000000677010111");
    }

    #[test]
    fn invalid_json_is_serialization_error() {
        let err = SchemeConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, PromptPayError::Serialization(_)));
    }

    #[test]
    fn rejects_bad_merchant_account_tag() {
        let err = SchemeConfig::from_json_str(r#"{"merchantAccountTag": "2A"}"#).unwrap_err();
        assert!(matches!(err, PromptPayError::InvalidTag(_)));
        let err = SchemeConfig::from_json_str(r#"{"merchantAccountTag": "52"}"#).unwrap_err();
        assert!(matches!(err, PromptPayError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_sub_tag_colliding_with_guid() {
        let err =
            SchemeConfig::from_json_str(r#"{"phone": {"subTag": "00"}}"#).unwrap_err();
        assert!(matches!(err, PromptPayError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_config_without_slots() {
        let err = SchemeConfig::from_json_str(
            r#"{"phone": null, "nationalId": null, "eWallet": null}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PromptPayError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_oversized_guid() {
        let config = SchemeConfig {
            guid: "A".repeat(100),
            ..SchemeConfig::promptpay()
        };
        assert!(matches!(
            config.validate(),
            Err(PromptPayError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn rejects_bad_constants() {
        let cases = [
            r#"{"currencyCode": "THB"}"#,
            r#"{"currencyCode": "7640"}"#,
            r#"{"countryCallingCode": "+66"}"#,
            r#"{"trunkPrefix": "x"}"#,
            r#"{"countryCode": "th"}"#,
            r#"{"guid": ""}"#,
            r#"{"phone": {"subTag": "01", "width": 0}}"#,
        ];
        for json in cases {
            let err = SchemeConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, PromptPayError::InvalidConfig(_)), "{json}");
        }
    }

    #[test]
    fn empty_trunk_prefix_is_allowed() {
        let config = SchemeConfig::from_json_str(r#"{"trunkPrefix": ""}"#).unwrap();
        assert_eq!(config.trunk_prefix, "");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"merchantAccountTag": "26", "currencyCode": "702"}}"#).unwrap();
        let config = SchemeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.merchant_account_tag, "26");
        assert_eq!(config.currency_code, "702");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SchemeConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PromptPayError::Io(_)));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn default_path_ends_with_scheme_file() {
        if let Ok(path) = SchemeConfig::default_path() {
            assert!(path.ends_with("promptpay-rs/scheme.json"));
        }
    }
}
