pub mod lanes;

pub use lanes::*;
