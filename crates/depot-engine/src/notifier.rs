//! # Movement Notifier Port
//!
//! After every state-changing call the engine emits one named event per
//! affected entity: the changed header, each changed asset row, each
//! appended ledger row. Events fire after the mutation commits,
//! at-least-once. The transport is the collaborator's concern; this module
//! only defines the port and three in-tree implementations.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use depot_state::{AssetRecord, BookingHeader, LedgerEntry};

/// A structured notification carrying the changed row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementEvent {
    /// A booking header row changed (created, metadata, or status).
    HeaderChanged {
        /// The header after the change.
        header: BookingHeader,
    },
    /// An asset registry row changed (scan, return, routing, settle).
    AssetChanged {
        /// The asset row after the change.
        asset: AssetRecord,
    },
    /// A row was appended to the movement ledger.
    LedgerAppended {
        /// The appended row.
        entry: LedgerEntry,
    },
}

impl MovementEvent {
    /// The event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HeaderChanged { .. } => "HEADER_CHANGED",
            Self::AssetChanged { .. } => "ASSET_CHANGED",
            Self::LedgerAppended { .. } => "LEDGER_APPENDED",
        }
    }
}

/// Observer port for engine mutations.
///
/// Implementations must tolerate being called from any thread and must not
/// call back into the engine (events fire while no locks are held, but a
/// re-entrant mutation from inside a notification would interleave with the
/// emitting operation's log ordering).
pub trait MovementNotifier: Send + Sync {
    /// Deliver one event. Delivery is at-least-once and best-effort;
    /// implementations handle their own transport failures.
    fn notify(&self, event: MovementEvent);
}

/// Discards every event. The default when no observer is wired up.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl MovementNotifier for NullNotifier {
    fn notify(&self, _event: MovementEvent) {}
}

/// Emits each event as a structured `tracing` log record.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl MovementNotifier for TracingNotifier {
    fn notify(&self, event: MovementEvent) {
        match &event {
            MovementEvent::HeaderChanged { header } => {
                tracing::info!(
                    event = event.name(),
                    draft_id = %header.draft_id,
                    booking_type = %header.booking_type,
                    status = %header.status,
                    "booking header changed"
                );
            }
            MovementEvent::AssetChanged { asset } => {
                tracing::info!(
                    event = event.name(),
                    asset_code = %asset.asset_code,
                    status = %asset.status,
                    "asset row changed"
                );
            }
            MovementEvent::LedgerAppended { entry } => {
                tracing::info!(
                    event = event.name(),
                    ref_code = %entry.ref_code,
                    asset_code = %entry.asset_code,
                    action = %entry.action,
                    "ledger row appended"
                );
            }
        }
    }
}

/// Captures events in memory, for tests and for batching bridges.
#[derive(Debug, Default)]
pub struct BufferingNotifier {
    events: Mutex<Vec<MovementEvent>>,
}

impl BufferingNotifier {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured events, oldest first.
    pub fn events(&self) -> Vec<MovementEvent> {
        self.events.lock().clone()
    }

    /// Take the captured events, leaving the buffer empty.
    pub fn drain(&self) -> Vec<MovementEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of captured events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl MovementNotifier for BufferingNotifier {
    fn notify(&self, event: MovementEvent) {
        self.events.lock().push(event);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
