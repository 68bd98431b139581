pub mod course;
pub mod grid;
pub mod macros;
pub mod operations;
pub mod slot;

#[cfg(test)]
pub(crate) mod fixtures;

pub use course::*;
pub use grid::*;
pub use operations::*;
pub use slot::*;
