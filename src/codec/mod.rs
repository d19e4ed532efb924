//! Text and binary encodings of temporal values.

pub mod text;
pub mod wire;
