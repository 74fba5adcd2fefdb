//! Core systems
//!
//! Cross-cutting concerns that are not tied to a peripheral or a protocol.

pub mod logging;
