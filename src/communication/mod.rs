//! Communication protocols
//!
//! Device-side protocol stacks. Currently only the Tower serial control
//! protocol is implemented.

pub mod tower;
