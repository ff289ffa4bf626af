//! # Movement Store
//!
//! In-memory row store backed by `DashMap`, one map per table: booking
//! headers keyed by draft id, asset registry rows keyed by asset code, and
//! the append-only ledger behind an `RwLock<Vec<_>>`. The asset map is the
//! single source of truth for "is this asset currently booked".
//!
//! ## Locking
//!
//! Two mechanisms cooperate:
//!
//! - **Row guards.** `header_mut` / `asset_mut` return the DashMap entry
//!   guard, so a caller's read-validate-write sequence on one row runs
//!   under a single write lock (TOCTOU-free, the `try_update` pattern).
//!
//! - **Operation gate.** Holding two entry guards from the same map can
//!   deadlock when the keys share a shard, so multi-row operations never
//!   do that. Instead they hold [`MovementStore::batch_op_guard`]
//!   exclusively while single-row operations hold
//!   [`MovementStore::single_op_guard`] shared. A batch holder sees a
//!   stable attached set without pinning individual rows.
//!
//! While holding a row guard a caller may take the ledger lock or read the
//! other map, never a second guard from the same map.

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use depot_core::{AssetCode, DraftId, MovementResult, RefCode};
use depot_state::{AssetRecord, BookingHeader, LedgerAction, LedgerEntry};

/// In-memory store for headers, assets, and the movement ledger.
pub struct MovementStore {
    headers: DashMap<DraftId, BookingHeader>,
    assets: DashMap<AssetCode, AssetRecord>,
    ledger: RwLock<Vec<LedgerEntry>>,
    op_gate: RwLock<()>,
}

impl MovementStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            headers: DashMap::new(),
            assets: DashMap::new(),
            ledger: RwLock::new(Vec::new()),
            op_gate: RwLock::new(()),
        }
    }

    // ─── Operation gate ──────────────────────────────────────────────

    /// Shared gate for operations that mutate at most one row per map.
    pub fn single_op_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.op_gate.read()
    }

    /// Exclusive gate for operations that read or mutate many rows.
    pub fn batch_op_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.op_gate.write()
    }

    // ─── Headers ─────────────────────────────────────────────────────

    /// Insert or replace a header row (hydration path).
    pub fn insert_header(&self, header: BookingHeader) {
        self.headers.insert(header.draft_id.clone(), header);
    }

    /// Whether a header row exists for `draft_id`.
    pub fn contains_header(&self, draft_id: &DraftId) -> bool {
        self.headers.contains_key(draft_id)
    }

    /// Snapshot of one header row.
    pub fn header(&self, draft_id: &DraftId) -> Option<BookingHeader> {
        self.headers.get(draft_id).map(|row| row.clone())
    }

    /// Write guard on one header row.
    pub fn header_mut(
        &self,
        draft_id: &DraftId,
    ) -> Option<RefMut<'_, DraftId, BookingHeader>> {
        self.headers.get_mut(draft_id)
    }

    /// Atomic insert-or-refresh, the create-draft upsert. Runs `update`
    /// under the row guard when the draft already exists, otherwise inserts
    /// `fresh()`. Returns a snapshot of the resulting row.
    pub fn upsert_header(
        &self,
        draft_id: DraftId,
        fresh: impl FnOnce() -> BookingHeader,
        update: impl FnOnce(&mut BookingHeader),
    ) -> BookingHeader {
        self.headers
            .entry(draft_id)
            .and_modify(update)
            .or_insert_with(fresh)
            .clone()
    }

    /// Snapshot of all header rows, oldest first.
    pub fn list_headers(&self) -> Vec<BookingHeader> {
        let mut rows: Vec<BookingHeader> =
            self.headers.iter().map(|row| row.clone()).collect();
        rows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.draft_id.cmp(&b.draft_id))
        });
        rows
    }

    /// Number of header rows.
    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    // ─── Assets ──────────────────────────────────────────────────────

    /// Insert or replace an asset row (registration and hydration path).
    pub fn insert_asset(&self, asset: AssetRecord) {
        self.assets.insert(asset.asset_code.clone(), asset);
    }

    /// Whether an asset row exists for `asset_code`.
    pub fn contains_asset(&self, asset_code: &AssetCode) -> bool {
        self.assets.contains_key(asset_code)
    }

    /// Snapshot of one asset row.
    pub fn asset(&self, asset_code: &AssetCode) -> Option<AssetRecord> {
        self.assets.get(asset_code).map(|row| row.clone())
    }

    /// Write guard on one asset row. The scan gate's check-then-set runs
    /// entirely under this guard.
    pub fn asset_mut(
        &self,
        asset_code: &AssetCode,
    ) -> Option<RefMut<'_, AssetCode, AssetRecord>> {
        self.assets.get_mut(asset_code)
    }

    /// Snapshot of all asset rows currently attached to `draft_id`,
    /// in scan order.
    pub fn attached_assets(&self, draft_id: &DraftId) -> Vec<AssetRecord> {
        let mut rows: Vec<AssetRecord> = self
            .assets
            .iter()
            .filter(|row| row.is_attached_to(draft_id))
            .map(|row| row.clone())
            .collect();
        rows.sort_by(|a, b| {
            a.scan_at
                .cmp(&b.scan_at)
                .then_with(|| a.asset_code.cmp(&b.asset_code))
        });
        rows
    }

    /// Number of assets currently attached to `draft_id`.
    pub fn attached_count(&self, draft_id: &DraftId) -> usize {
        self.assets
            .iter()
            .filter(|row| row.is_attached_to(draft_id))
            .count()
    }

    /// Snapshot of all asset rows.
    pub fn list_assets(&self) -> Vec<AssetRecord> {
        let mut rows: Vec<AssetRecord> =
            self.assets.iter().map(|row| row.clone()).collect();
        rows.sort_by(|a, b| a.asset_code.cmp(&b.asset_code));
        rows
    }

    /// Number of asset rows.
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    // ─── Ledger ──────────────────────────────────────────────────────

    /// Append a digest-stamped row. The ledger is insert-only; nothing
    /// here, or anywhere else, removes rows.
    pub fn append_entry(&self, entry: LedgerEntry) {
        self.ledger.write().push(entry);
    }

    /// Total ledger rows.
    pub fn ledger_len(&self) -> usize {
        self.ledger.read().len()
    }

    /// All rows for one reference code, in append order.
    pub fn ledger_for_ref(&self, ref_code: &RefCode) -> Vec<LedgerEntry> {
        self.ledger
            .read()
            .iter()
            .filter(|entry| entry.ref_code == *ref_code)
            .cloned()
            .collect()
    }

    /// Snapshot of the whole ledger, in append order.
    pub fn ledger_snapshot(&self) -> Vec<LedgerEntry> {
        self.ledger.read().clone()
    }

    /// The most recent row for `asset_code` whose recorded status is a
    /// settled one. Rows record post-event state, so this answers "what was
    /// this asset before its current scan" for rows hydrated without a
    /// prior-state snapshot.
    pub fn last_settled_entry(&self, asset_code: &AssetCode) -> Option<LedgerEntry> {
        self.ledger
            .read()
            .iter()
            .rev()
            .find(|entry| entry.asset_code == *asset_code && !entry.asset_status.is_reserved())
            .cloned()
    }

    /// Find the `MOVED` row for `ref_code` that records the scan currently
    /// stamped on `asset` and, if its routing snapshot has drifted from the
    /// asset row, refresh it in place (re-stamping the digest). Returns the
    /// matched row, or `None` when the scan has no row yet.
    ///
    /// This is the re-finalize merge: match means skip-insert, `None` means
    /// the caller appends a fresh row.
    pub fn reconcile_moved_entry(
        &self,
        ref_code: &RefCode,
        asset: &AssetRecord,
    ) -> MovementResult<Option<LedgerEntry>> {
        let mut ledger = self.ledger.write();
        for entry in ledger.iter_mut().rev() {
            if entry.action != LedgerAction::Moved || entry.ref_code != *ref_code {
                continue;
            }
            if !entry.matches_scan(asset) {
                continue;
            }
            if entry.origin != asset.origin || entry.destination != asset.destination {
                entry.refresh_routing(asset.origin.clone(), asset.destination.clone())?;
            }
            return Ok(Some(entry.clone()));
        }
        Ok(None)
    }

    // ─── Reference code scan ─────────────────────────────────────────

    /// Highest sequence already coded for `prefix` + `date_part`, scanning
    /// existing header codes. `None` when no code shares the pair. Callers
    /// serialize assignment on the generator lock; this scan alone is not
    /// atomic with the subsequent write.
    pub fn max_sequence(&self, prefix: char, date_part: &str) -> Option<u16> {
        self.headers
            .iter()
            .filter_map(|row| row.ref_code.clone())
            .filter(|code| code.prefix() == prefix && code.date_part() == date_part)
            .map(|code| code.sequence())
            .max()
    }
}

impl Default for MovementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MovementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementStore")
            .field("headers", &self.headers.len())
            .field("assets", &self.assets.len())
            .field("ledger_rows", &self.ledger.read().len())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::{ActorId, Timestamp};
    use depot_state::{AssetStatus, BookingType, MovementObjective};

    fn store() -> MovementStore {
        MovementStore::new()
    }

    fn actor() -> ActorId {
        ActorId::new("clerk1").unwrap()
    }

    fn draft(id: &str) -> DraftId {
        DraftId::new(id).unwrap()
    }

    fn header(id: &str) -> BookingHeader {
        BookingHeader::new(
            draft(id),
            BookingType::Outbound,
            MovementObjective::Standard,
            actor(),
        )
    }

    fn attached_asset(code: &str, draft_id: &str, seq: u16) -> AssetRecord {
        let mut asset = AssetRecord::new(AssetCode::new(code).unwrap(), AssetStatus::Available);
        asset.attach(
            AssetStatus::ReservedForIssue,
            draft(draft_id),
            RefCode::from_parts('O', "250825", seq).unwrap(),
            actor(),
            Timestamp::from_epoch_secs(1_756_100_000 + i64::from(seq)).unwrap(),
            None,
            None,
        );
        asset
    }

    #[test]
    fn upsert_header_inserts_then_updates() {
        let store = store();
        let first = store.upsert_header(draft("D1"), || header("D1"), |_| unreachable!());
        assert_eq!(store.header_count(), 1);

        let mut updated = false;
        let second = store.upsert_header(
            draft("D1"),
            || unreachable!(),
            |h| {
                h.touch(&actor());
                updated = true;
            },
        );
        assert!(updated);
        assert_eq!(second.draft_id, first.draft_id);
        assert_eq!(store.header_count(), 1);
    }

    #[test]
    fn attached_assets_filters_and_orders_by_scan_time() {
        let store = store();
        store.insert_asset(attached_asset("A300", "D1", 3));
        store.insert_asset(attached_asset("A100", "D1", 1));
        store.insert_asset(attached_asset("B100", "D2", 2));
        store.insert_asset(AssetRecord::new(
            AssetCode::new("FREE1").unwrap(),
            AssetStatus::Available,
        ));

        let attached = store.attached_assets(&draft("D1"));
        let codes: Vec<&str> = attached.iter().map(|a| a.asset_code.as_str()).collect();
        assert_eq!(codes, vec!["A100", "A300"]);
        assert_eq!(store.attached_count(&draft("D1")), 2);
        assert_eq!(store.attached_count(&draft("D2")), 1);
        assert_eq!(store.attached_count(&draft("D9")), 0);
    }

    #[test]
    fn ledger_queries_by_ref_code() {
        let store = store();
        let code_a = RefCode::new("O2508250001").unwrap();
        let code_b = RefCode::new("O2508250002").unwrap();
        let asset = attached_asset("A100", "D1", 1);

        for code in [&code_a, &code_a, &code_b] {
            store.append_entry(
                LedgerEntry::capture(
                    LedgerAction::Moved,
                    code,
                    &draft("D1"),
                    BookingType::Outbound,
                    &asset,
                    asset.status,
                    &actor(),
                    Timestamp::now(),
                )
                .unwrap(),
            );
        }

        assert_eq!(store.ledger_len(), 3);
        assert_eq!(store.ledger_for_ref(&code_a).len(), 2);
        assert_eq!(store.ledger_for_ref(&code_b).len(), 1);
    }

    #[test]
    fn last_settled_entry_skips_reserved_rows() {
        let store = store();
        let code = RefCode::new("D2508250001").unwrap();
        let asset = attached_asset("A100", "D1", 1);

        // Older settled row, then a reserved MOVED row on top.
        store.append_entry(
            LedgerEntry::capture(
                LedgerAction::Confirmed,
                &code,
                &draft("D0"),
                BookingType::DefectRequest,
                &asset,
                AssetStatus::AwaitingPickup,
                &actor(),
                Timestamp::from_epoch_secs(1_756_000_000).unwrap(),
            )
            .unwrap(),
        );
        store.append_entry(
            LedgerEntry::capture(
                LedgerAction::Moved,
                &code,
                &draft("D1"),
                BookingType::DefectRequest,
                &asset,
                AssetStatus::ReservedForRepair,
                &actor(),
                Timestamp::from_epoch_secs(1_756_100_000).unwrap(),
            )
            .unwrap(),
        );

        let settled = store
            .last_settled_entry(&AssetCode::new("A100").unwrap())
            .unwrap();
        assert_eq!(settled.asset_status, AssetStatus::AwaitingPickup);
        assert!(store
            .last_settled_entry(&AssetCode::new("OTHER").unwrap())
            .is_none());
    }

    #[test]
    fn reconcile_matches_and_refreshes_routing() {
        let store = store();
        let code = RefCode::new("O2508250001").unwrap();
        let mut asset = attached_asset("A100", "D1", 1);
        store.append_entry(
            LedgerEntry::capture(
                LedgerAction::Moved,
                &code,
                &draft("D1"),
                BookingType::Outbound,
                &asset,
                asset.status,
                &actor(),
                Timestamp::now(),
            )
            .unwrap(),
        );

        // Routing drifted on the asset after the row was written.
        asset.apply_routing(
            Some(&depot_core::SiteId::new("WH1").unwrap()),
            Some(&depot_core::SiteId::new("SITE2").unwrap()),
        );

        let matched = store.reconcile_moved_entry(&code, &asset).unwrap().unwrap();
        assert_eq!(matched.destination.as_ref().unwrap().as_str(), "SITE2");
        assert!(matched.verify_digest().unwrap());
        assert_eq!(store.ledger_len(), 1);

        // The stored row itself was refreshed.
        let stored = store.ledger_for_ref(&code);
        assert_eq!(stored[0].destination.as_ref().unwrap().as_str(), "SITE2");
    }

    #[test]
    fn reconcile_returns_none_for_unrecorded_scan() {
        let store = store();
        let code = RefCode::new("O2508250001").unwrap();
        let asset = attached_asset("A100", "D1", 1);
        assert!(store.reconcile_moved_entry(&code, &asset).unwrap().is_none());
    }

    #[test]
    fn max_sequence_scans_header_codes() {
        let store = store();
        assert_eq!(store.max_sequence('O', "250825"), None);

        for (id, seq) in [("D1", 1), ("D2", 7), ("D3", 3)] {
            let mut h = header(id);
            h.assign_ref_code(RefCode::from_parts('O', "250825", seq).unwrap(), &actor())
                .unwrap();
            store.insert_header(h);
        }
        let mut other_day = header("D4");
        other_day
            .assign_ref_code(RefCode::from_parts('O', "250826", 9).unwrap(), &actor())
            .unwrap();
        store.insert_header(other_day);

        assert_eq!(store.max_sequence('O', "250825"), Some(7));
        assert_eq!(store.max_sequence('O', "250826"), Some(9));
        assert_eq!(store.max_sequence('I', "250825"), None);
    }

    #[test]
    fn debug_prints_row_counts() {
        let store = store();
        store.insert_header(header("D1"));
        let rendered = format!("{store:?}");
        assert!(rendered.contains("headers: 1"), "{rendered}");
    }
}
