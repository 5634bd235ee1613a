//! Junction detection and crossroad conversion.

mod convert;
mod detect;
mod union_find;

pub use convert::{convert_crossings, ConversionReport};
pub use detect::{detect, JunctionHint};
