//! EMVCo Merchant Presented Mode payload encoder for PromptPay-style QR
//! payments.
//!
//! Builds the text payload a banking app scans: nested tag-length-value
//! fields terminated by a CRC-16/CCITT-FALSE checksum. Rendering the QR
//! symbol itself is left to any conforming QR encoder.
//!
//! ```
//! use promptpay_rs::models::IdentifierKind;
//!
//! let payload = promptpay_rs::generate("081-234-5678", IdentifierKind::Phone, Some(125.0))?;
//! assert_eq!(
//!     payload,
//!     "00020101021229370016A000000677010111011300668123456785802TH53037645406125.0063043553"
//! );
//! # Ok::<(), promptpay_rs::error::PromptPayError>(())
//! ```

pub mod crc;
pub mod error;
pub mod models;
pub mod payload;
pub mod scheme;
pub mod tlv;

pub use error::{PromptPayError, Result};
pub use payload::{Payload, PayloadBuilder, generate};
pub use scheme::SchemeConfig;
