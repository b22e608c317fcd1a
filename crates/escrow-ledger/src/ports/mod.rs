//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Ports (Inbound)**: `EnvelopeLedgerApi`, `SingleLockApi`
//! - **Driven Ports (Outbound)**: `EnvelopeStore`, `LockStore`, `ValueTransfer`, `TimeSource`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
