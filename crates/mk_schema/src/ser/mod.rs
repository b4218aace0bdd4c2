//! Encoding: typed and dynamic values into JSON, per [`ViewContext`](crate::ViewContext).

// -----------------------------------------------------------------------------
// Modules

mod encoder;

// -----------------------------------------------------------------------------
// Exports

pub use encoder::Encoder;
