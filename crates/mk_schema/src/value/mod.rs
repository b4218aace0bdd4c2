//! Runtime values: scalars, dynamic values, open maps and change sets.

// -----------------------------------------------------------------------------
// Modules

mod change_set;
mod dynamic;
mod primitive;

// -----------------------------------------------------------------------------
// Exports

pub use change_set::ChangeSet;
pub use dynamic::{Dynamic, OpenMap};
pub use primitive::Primitive;
