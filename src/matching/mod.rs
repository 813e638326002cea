pub mod conflicts;
pub mod customer;
pub mod project;
pub mod similarity;
pub mod task;

pub use conflicts::*;
pub use customer::*;
pub use project::*;
pub use similarity::*;
pub use task::*;
