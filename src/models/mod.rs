// Core data models for the planner
// Tasks, decoded rows and column mappings

pub mod task;
pub mod record;
pub mod mapping;

pub use task::*;
pub use record::*;
pub use mapping::*;
