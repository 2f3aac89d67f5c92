//! Shape and partition algebra shared by the logical and physical graphs.
//!
//! [`Scale`] values describe extents, grid coordinates, and offsets; [`NVector`] lays values out
//! over an N-dimensional partition grid; [`partition`] builds and validates partition schemes.

mod nvector;
pub mod partition;
mod scale;

pub use nvector::NVector;
pub use partition::PartInfo;
pub use scale::{Dims, Scale, ScaleRange};
