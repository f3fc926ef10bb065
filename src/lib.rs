//! Shiftwave: a real-time bytebeat synthesizer with a live-editable
//! expression language.

pub mod audio;
pub mod config;
pub mod console;
pub mod dsl;
pub mod engine;
pub mod presets;
