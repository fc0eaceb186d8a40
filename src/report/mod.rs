//! Run summary rendering.

pub mod generator;

pub use generator::*;
