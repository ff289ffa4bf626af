//! # depot-store — In-Memory Row Store
//!
//! The storage layer of the Depot stack: three in-memory tables (booking
//! headers, asset registry rows, movement ledger) with the locking that
//! makes engine operations atomic. The engine composes its operations from
//! this crate's row guards and operation gate; the durable backend
//! (`depot-db`) hydrates a store at startup and mirrors writes back out.
//!
//! See [`MovementStore`] for the locking protocol.

pub mod store;

pub use store::MovementStore;
