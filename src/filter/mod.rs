pub mod engine;
pub mod route;

pub use engine::*;
pub use route::*;
