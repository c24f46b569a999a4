//! Type definitions shared across the pipeline
//!
//! Fetched source material and the synthesized persona it produces.

mod persona;
mod source;

pub use persona::*;
pub use source::*;
