//! # depot-state — Domain Entities and State Machines
//!
//! Pure-domain layer of the Depot stack: booking headers, asset registry
//! rows, the movement ledger, and the per-workflow profile table. This crate
//! knows every rule about what a single entity may do; it knows nothing
//! about concurrency, storage, or who is calling. Multi-entity operations
//! (scan, finalize, reversal) are composed from these pieces in the engine
//! crate.
//!
//! ## Modules
//!
//! - **Booking** (`booking.rs`): [`BookingHeader`] and the
//!   `INITIAL → CONFIRMED → FINALIZED → COMPLETED` lifecycle with the
//!   `UNLOCKED_FOR_EDIT` rework loop and `CANCELLED` exit. Transitions are
//!   guard methods; [`BookingStatus::valid_transitions()`] is the single
//!   source of truth for the edge set.
//!
//! - **Asset** (`asset.rs`): [`AssetRecord`] with attachment represented
//!   directly on the row, plus the [`PriorState`] snapshot that makes
//!   reversal restore what the scan found instead of a guessed default.
//!
//! - **Ledger** (`ledger.rs`): append-only [`LedgerEntry`] rows
//!   (`MOVED` / `CONFIRMED` / `RETURNED`), each digest-stamped over its
//!   canonical JSON form.
//!
//! - **Profile** (`profile.rs`): the [`MovementProfile`] table that gives
//!   the four booking types their distinct scan/settle behavior, with a
//!   validated YAML overlay for deployments that need different codes.
//!
//! ## Design
//!
//! States are runtime-validated enums rather than typestate: headers and
//! assets round-trip through a concurrent store and a database, so status is
//! data, not a compile-time type. Every transition method rejects illegal
//! moves with [`MovementError::IllegalTransition`](depot_core::MovementError)
//! and appends to the entity's transition log.

pub mod asset;
pub mod booking;
pub mod ledger;
pub mod profile;

// ─── Booking re-exports ─────────────────────────────────────────────

pub use booking::{
    BookingHeader, BookingStatus, BookingType, HeaderPatch, MovementObjective, StatusChange,
};

// ─── Asset re-exports ───────────────────────────────────────────────

pub use asset::{AssetRecord, AssetStatus, PriorState};

// ─── Ledger re-exports ──────────────────────────────────────────────

pub use ledger::{LedgerAction, LedgerEntry, LedgerEntryId};

// ─── Profile re-exports ─────────────────────────────────────────────

pub use profile::{MovementProfile, ProfileError, ProfileTable};
