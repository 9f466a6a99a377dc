//! Integration test modules for Strobe
//!
//! - engine: port discovery, settings persistence, dispatcher thread
//! - properties: behavior guaranteed by the MIDI subsystem

pub mod engine;
pub mod properties;
