//! # Depot Engine
//!
//! Executes booking operations against the in-memory movement store. Every
//! operation is a method on [`BookingEngine`] and is atomic: validation runs
//! under the store's operation gate and row locks, so a rejected call leaves
//! no partial effect.
//!
//! Operations by module:
//!
//! - `session`: draft creation, header metadata, unlock, cancel
//! - `scan`: attaching assets to open bookings
//! - `reversal`: returning assets, single or batched
//! - `refcode`: reference code assignment
//! - `finalize`: finalize and output confirmation
//!
//! Observers subscribe through [`MovementNotifier`]; the engine emits one
//! event per changed header, asset, or ledger row, after the change commits.

pub mod engine;
pub mod notifier;

mod finalize;
mod refcode;
mod reversal;
mod scan;
mod session;

pub use engine::BookingEngine;
pub use notifier::{
    BufferingNotifier, MovementEvent, MovementNotifier, NullNotifier, TracingNotifier,
};
