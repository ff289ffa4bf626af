//! # Booking Engine
//!
//! [`BookingEngine`] is the operational surface of the Depot core: one
//! shared, thread-safe value composing the row store, the movement profile
//! table, the notifier port, and the serialized reference code generator.
//! The operations themselves live in sibling modules (`session`, `scan`,
//! `refcode`, `finalize`, `reversal`); this module owns construction and
//! the read accessors.

use std::sync::Arc;

use parking_lot::Mutex;

use depot_core::{ActorId, AssetCode, DraftId, MovementError, MovementResult, RefCode};
use depot_state::{
    AssetRecord, BookingHeader, BookingType, LedgerEntry, MovementProfile, ProfileTable,
};
use depot_store::MovementStore;

use crate::notifier::{MovementEvent, MovementNotifier, NullNotifier};

/// The asset movement booking engine.
///
/// Cheap to share: wrap in an `Arc` and call from any thread. All methods
/// take `&self`; interior locking follows the store's protocol (row guards
/// plus the operation gate) with one addition, the generator lock that
/// serializes reference code assignment.
pub struct BookingEngine {
    store: Arc<MovementStore>,
    profiles: ProfileTable,
    notifier: Arc<dyn MovementNotifier>,
    /// Serializes scan-max-sequence-then-write during code assignment.
    refcode_lock: Mutex<()>,
}

impl BookingEngine {
    /// Create an engine over `store` with the built-in profile table and no
    /// observer.
    pub fn new(store: Arc<MovementStore>) -> Self {
        Self {
            store,
            profiles: ProfileTable::builtin(),
            notifier: Arc::new(NullNotifier),
            refcode_lock: Mutex::new(()),
        }
    }

    /// Replace the profile table (builder style). The table is fixed after
    /// construction; profiles are configuration, not state.
    pub fn with_profiles(mut self, profiles: ProfileTable) -> Self {
        self.profiles = profiles;
        self
    }

    /// Attach an observer (builder style).
    pub fn with_notifier(mut self, notifier: Arc<dyn MovementNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &MovementStore {
        &self.store
    }

    /// The active profile table.
    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub(crate) fn profile(&self, booking_type: BookingType) -> &MovementProfile {
        self.profiles.get(booking_type)
    }

    pub(crate) fn refcode_lock(&self) -> &Mutex<()> {
        &self.refcode_lock
    }

    // ─── Read accessors ──────────────────────────────────────────────

    /// The header row for `draft_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::NotFound`] when no such draft exists.
    pub fn header(&self, draft_id: &DraftId) -> MovementResult<BookingHeader> {
        self.store
            .header(draft_id)
            .ok_or_else(|| Self::booking_not_found(draft_id))
    }

    /// All assets currently attached to `draft_id`, in scan order.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::NotFound`] when no such draft exists.
    pub fn attached_assets(&self, draft_id: &DraftId) -> MovementResult<Vec<AssetRecord>> {
        if !self.store.contains_header(draft_id) {
            return Err(Self::booking_not_found(draft_id));
        }
        Ok(self.store.attached_assets(draft_id))
    }

    /// The registry row for `asset_code`.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::NotFound`] when no such asset exists.
    pub fn asset(&self, asset_code: &AssetCode) -> MovementResult<AssetRecord> {
        self.store
            .asset(asset_code)
            .ok_or_else(|| Self::asset_not_found(asset_code))
    }

    /// All ledger rows for a reference code, in append order. Empty when
    /// the code has no rows yet.
    pub fn ledger_for_ref(&self, ref_code: &RefCode) -> Vec<LedgerEntry> {
        self.store.ledger_for_ref(ref_code)
    }

    /// Snapshot of every header row, oldest first.
    pub fn list_headers(&self) -> Vec<BookingHeader> {
        self.store.list_headers()
    }

    // ─── Shared internals ────────────────────────────────────────────

    pub(crate) fn booking_not_found(draft_id: &DraftId) -> MovementError {
        MovementError::NotFound {
            kind: "booking",
            key: draft_id.to_string(),
        }
    }

    pub(crate) fn asset_not_found(asset_code: &AssetCode) -> MovementError {
        MovementError::NotFound {
            kind: "asset",
            key: asset_code.to_string(),
        }
    }

    /// Resolve the header's reference code, or mint one through the
    /// generator when the header has none (a header never reaches a ledger
    /// row or an asset row without a code).
    pub(crate) fn ensure_ref_code(
        &self,
        header: &BookingHeader,
        actor: &ActorId,
        now: depot_core::Timestamp,
    ) -> MovementResult<RefCode> {
        match &header.ref_code {
            Some(code) => Ok(code.clone()),
            None => self.assign_ref_code_locked(&header.draft_id, actor, now),
        }
    }

    // Events fire after the mutation commits, while no locks are held.

    pub(crate) fn emit_header(&self, header: &BookingHeader) {
        self.notifier.notify(MovementEvent::HeaderChanged {
            header: header.clone(),
        });
    }

    pub(crate) fn emit_asset(&self, asset: &AssetRecord) {
        self.notifier.notify(MovementEvent::AssetChanged {
            asset: asset.clone(),
        });
    }

    pub(crate) fn emit_entry(&self, entry: &LedgerEntry) {
        self.notifier.notify(MovementEvent::LedgerAppended {
            entry: entry.clone(),
        });
    }
}

impl std::fmt::Debug for BookingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEngine")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
