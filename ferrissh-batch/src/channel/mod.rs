//! Channel layer for prompt detection.
//!
//! Device output is accumulated in a [`PatternBuffer`] which strips
//! terminal escape sequences as data arrives.

mod buffer;

pub use buffer::PatternBuffer;
