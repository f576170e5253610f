//! Streaming readers.
//!
//! Only XML for now; anything that yields forward-only typed tokens can feed
//! the converter.

pub mod xml;
