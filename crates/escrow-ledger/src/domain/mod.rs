//! # Domain Layer (Inner Hexagon)
//!
//! Pure accounting logic for time-locked envelopes.
//! NO I/O, NO async, NO clocks: time is always an argument.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod services;
pub mod snapshot;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use services::*;
pub use snapshot::LedgerSnapshot;
pub use value_objects::*;
