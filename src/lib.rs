#![cfg_attr(not(test), no_std)]

//! tower-link - Device-side implementation of the Tower serial control protocol
//!
//! A host issues fixed-size 5-byte command packets over a byte-oriented link;
//! the device decodes them, executes an action (report status, persist a
//! configuration value, program/erase non-volatile storage, set the clock),
//! and acknowledges when requested.

// Platform abstraction layer (flash sequencer, UART, RTC)
pub mod platform;

// Core systems (logging)
pub mod core;

// Communication (byte pipes, packet codec, dispatcher, link context)
pub mod communication;

// Crate-level error aggregation
pub mod error;

// Non-volatile variable store over sector-erase/phrase-program flash
pub mod storage;

// Persistent device configuration (device number, device mode)
pub mod parameters;
