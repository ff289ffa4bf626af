//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the Depot stack.
//! Each identifier is a distinct type — you cannot pass an [`AssetCode`]
//! where a [`DraftId`] is expected.
//!
//! ## Validation
//!
//! String-based identifiers ([`AssetCode`], [`DraftId`], [`SiteId`],
//! [`ActorId`], [`RefCode`]) validate format at construction time. The
//! UUID-based [`ScanId`] is always valid by construction.
//!
//! ## Formats
//!
//! - AssetCode: the label printed on the physical asset (barcode content)
//! - RefCode: `<prefix><YYMMDD><NNNN>` — one uppercase letter, six date
//!   digits, four sequence digits
//! - DraftId: caller-supplied booking session key, stable across retries

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time — not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Characters permitted in asset and site codes. Matches what the barcode
/// printers emit: alphanumeric plus `-`, `_`, and `.`.
fn is_code_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

// ---------------------------------------------------------------------------
// UUID-based identifiers (always valid by construction)
// ---------------------------------------------------------------------------

/// A unique identifier for a single scan event.
///
/// Minted fresh each time an asset is attached to a booking. Scan timestamps
/// carry seconds precision, so two scans by the same operator can share a
/// `(scan_by, scan_at)` pair; the scan id is the unambiguous de-duplication
/// key for ledger reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(Uuid);

impl ScanId {
    /// Create a new random scan identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a scan identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ScanId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ScanId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// String-based identifiers (validated at construction)
// ---------------------------------------------------------------------------

/// The business key of a physical asset (box, container, equipment).
///
/// This is the label on the asset itself — what the handheld scanner reads.
///
/// # Validation
///
/// - 1 to 64 characters after trimming
/// - Alphanumeric plus `-`, `_`, `.`
///
/// Ordered so multi-asset operations can take row locks in a deterministic
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AssetCode(String);

impl_validating_deserialize!(AssetCode);

impl AssetCode {
    /// Create an asset code, validating format.
    ///
    /// Surrounding whitespace is stripped; scanners occasionally append a
    /// trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAssetCode`] if the trimmed value is
    /// empty, longer than 64 characters, or contains characters outside the
    /// barcode alphabet.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > 64 || !trimmed.chars().all(is_code_char) {
            return Err(ValidationError::InvalidAssetCode(raw));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the asset code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AssetCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The caller-supplied key of a booking draft session.
///
/// Chosen by the client when the draft is opened and stable for the life of
/// the booking, so a retried request lands on the same session.
///
/// # Validation
///
/// - 1 to 128 characters
/// - No whitespace, no control characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DraftId(String);

impl_validating_deserialize!(DraftId);

impl DraftId {
    /// Create a draft id, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDraftId`] if the value is empty,
    /// longer than 128 characters, or contains whitespace or control
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty()
            || s.len() > 128
            || s.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ValidationError::InvalidDraftId(s));
        }
        Ok(Self(s))
    }

    /// Access the draft id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DraftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DraftId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A site (warehouse, customer location, repair vendor) in routing fields.
///
/// # Validation
///
/// - 1 to 32 characters after trimming
/// - Alphanumeric plus `-`, `_`, `.`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SiteId(String);

impl_validating_deserialize!(SiteId);

impl SiteId {
    /// Create a site id, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSiteId`] on empty, overlong, or
    /// out-of-alphabet input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > 32 || !trimmed.chars().all(is_code_char) {
            return Err(ValidationError::InvalidSiteId(raw));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the site id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SiteId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The operator performing a mutation, recorded in audit columns.
///
/// Opaque to the engine: authentication happens upstream, this type only
/// carries the resolved principal into scan/status/audit fields.
///
/// # Validation
///
/// - 1 to 128 characters after trimming
/// - No control characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ActorId(String);

impl_validating_deserialize!(ActorId);

impl ActorId {
    /// Create an actor id, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidActorId`] on empty or overlong
    /// input, or input containing control characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > 128 || trimmed.chars().any(|c| c.is_control()) {
            return Err(ValidationError::InvalidActorId(raw));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the actor id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ActorId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A human-readable booking reference code: `<prefix><YYMMDD><NNNN>`.
///
/// One uppercase prefix letter identifying the movement kind, six date
/// digits, and a four-digit daily sequence starting at `0001`. Example:
/// `O2508250012` — the twelfth outbound booking coded on 2025-08-25.
///
/// Assigned to a booking at most once; printed on pick lists and quoted in
/// ledger rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RefCode(String);

impl_validating_deserialize!(RefCode);

impl RefCode {
    /// Total length: 1 prefix + 6 date digits + 4 sequence digits.
    pub const LEN: usize = 11;

    /// Highest sequence number a single prefix+date can carry.
    pub const MAX_SEQUENCE: u16 = 9999;

    /// Create a reference code from a full string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRefCode`] unless the value is
    /// exactly one uppercase ASCII letter, six digits, then four digits
    /// with a sequence of at least `0001`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == Self::LEN
            && bytes[0].is_ascii_uppercase()
            && bytes[1..].iter().all(|b| b.is_ascii_digit())
            && &s[7..] != "0000";
        if !well_formed {
            return Err(ValidationError::InvalidRefCode(s));
        }
        Ok(Self(s))
    }

    /// Compose a reference code from its parts.
    ///
    /// `yymmdd` is the six-digit compact date (see
    /// [`Timestamp::compact_date`](crate::Timestamp::compact_date)).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRefCode`] if the prefix is not an
    /// uppercase ASCII letter, the date part is not six digits, or the
    /// sequence is outside `1..=9999`.
    pub fn from_parts(prefix: char, yymmdd: &str, sequence: u16) -> Result<Self, ValidationError> {
        if !prefix.is_ascii_uppercase()
            || yymmdd.len() != 6
            || !yymmdd.chars().all(|c| c.is_ascii_digit())
            || sequence == 0
            || sequence > Self::MAX_SEQUENCE
        {
            return Err(ValidationError::InvalidRefCode(format!(
                "{prefix}{yymmdd}#{sequence}"
            )));
        }
        Ok(Self(format!("{prefix}{yymmdd}{sequence:04}")))
    }

    /// Access the full code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The movement-kind prefix letter.
    pub fn prefix(&self) -> char {
        self.0.as_bytes()[0] as char
    }

    /// The six-digit compact date part (`YYMMDD`).
    pub fn date_part(&self) -> &str {
        &self.0[1..7]
    }

    /// The daily sequence number (1 to 9999).
    pub fn sequence(&self) -> u16 {
        // Four ASCII digits by construction; 9999 fits in u16.
        self.0.as_bytes()[7..]
            .iter()
            .fold(0, |n, b| n * 10 + u16::from(b - b'0'))
    }
}

impl std::fmt::Display for RefCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RefCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
