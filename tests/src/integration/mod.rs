//! Cross-component integration tests.

pub mod flows;
