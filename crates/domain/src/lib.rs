pub mod entities;
pub mod repositories;
pub mod value_objects;

pub use entities::*;
pub use labsched_core::{SchedulerError, SchedulerResult};
pub use repositories::*;
pub use value_objects::*;
