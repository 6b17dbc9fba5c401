//! Data models for payment payload inputs.
//!
//! Strongly-typed payee identifiers, amounts, and the enumerations that
//! drive field selection in the assembled payload.

mod amount;
mod enums;
mod identifier;

pub use amount::MonetaryAmount;
pub use enums::{IdentifierKind, PointOfInitiation};
pub use identifier::{PayeeIdentifier, normalize};
