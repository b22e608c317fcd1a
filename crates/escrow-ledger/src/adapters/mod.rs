//! # Adapters Layer (Outer Hexagon)
//!
//! In-memory storage, clocks and a recording payout book implementing the
//! outbound ports.

mod clock;
mod memory_store;
mod payouts;

pub use clock::{ManualClock, SystemClock};
pub use memory_store::{
    capture_snapshot, restore_snapshot, InMemoryEnvelopeStore, InMemoryLockStore,
};
pub use payouts::InMemoryPayouts;
