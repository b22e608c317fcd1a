//! # Timelock Escrow Test Suite
//!
//! Unified test crate for the escrow ledger.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── flows.rs        # End-to-end deposit/disburse/withdraw scenarios
//! │   └── reentrancy.rs   # Payees that call back into the ledger
//! └── benches/
//!     └── ledger_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p escrow-tests
//!
//! # Benchmarks
//! cargo bench -p escrow-tests
//! ```

#![allow(dead_code)]

pub mod integration;
