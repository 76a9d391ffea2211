//! GPU service wire types

mod gpu;

pub use gpu::*;
