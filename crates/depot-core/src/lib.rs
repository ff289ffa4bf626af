//! # depot-core — Foundational Types for the Depot Stack
//!
//! This crate is the bedrock of the Depot asset movement stack. It defines
//! the type-system primitives every other crate builds on. Every other crate
//! in the workspace depends on `depot-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** [`AssetCode`], [`DraftId`],
//!    [`RefCode`], [`SiteId`], [`ActorId`], [`ScanId`] — all newtypes with
//!    validated constructors. No bare strings for identifiers.
//!
//! 2. **UTC-only timestamps.** The [`Timestamp`] type enforces UTC with Z
//!    suffix and seconds precision. Audit columns compare and sort the same
//!    way no matter which process wrote them.
//!
//! 3. **One error enum.** [`MovementError`] covers every business-rule
//!    rejection the engine can produce; callers match on variants, never on
//!    message strings.
//!
//! 4. **Digests flow through `CanonicalBytes`.** Ledger row digests are
//!    computed over RFC 8785 canonical bytes, so the same row always hashes
//!    to the same value regardless of field order at the serialization site.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `depot-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use digest::{sha256_hex, CanonicalBytes};
pub use error::{MovementError, MovementResult, ValidationError};
pub use identity::{ActorId, AssetCode, DraftId, RefCode, ScanId, SiteId};
pub use temporal::Timestamp;
