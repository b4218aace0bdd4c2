//! Decoding: JSON values into typed and dynamic values.

// -----------------------------------------------------------------------------
// Modules

mod decoder;

// -----------------------------------------------------------------------------
// Exports

pub use decoder::Decoder;
