//! Small helpers shared by the block encoder and decoder.

mod bits;
pub(crate) mod ref_count;

pub use bits::*;
